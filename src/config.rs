use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pages: PageSizes,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Page sizes per screen.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub list: u32,
    pub search: u32,
    pub sources: u32,
    pub dashboard: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            list: 12,
            search: 10,
            sources: 20,
            dashboard: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kbase")
}

pub fn log_path() -> PathBuf {
    data_dir().join("kbase.log")
}

pub fn load_config() -> Result<AppConfig> {
    let path = config_path();
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        parse_config(&contents)?
    } else {
        AppConfig::default()
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).with_context(|| "Failed to parse config.toml")
}

/// `KBASE_API_URL` and `KBASE_LOG` win over the file.
pub fn apply_env(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("KBASE_API_URL").filter(|v| !v.trim().is_empty()) {
        config.api.base_url = url;
    }
    if let Some(level) = lookup("KBASE_LOG").filter(|v| !v.trim().is_empty()) {
        config.log.level = level;
    }
    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.pages.list, 12);
        assert_eq!(config.pages.search, 10);
        assert_eq!(config.pages.sources, 20);
        assert_eq!(config.pages.dashboard, 5);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = parse_config(
            r#"
            [api]
            base_url = "https://kb.example.com/api/"

            [pages]
            search = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.pages.search, 25);
        assert_eq!(config.pages.list, 12);
        assert_eq!(config.api.base_url, "https://kb.example.com/api/");
    }

    #[test]
    fn env_overrides_file_and_trims_slash() {
        let mut config = parse_config("[api]\nbase_url = \"http://file\"\n").unwrap();
        apply_env(&mut config, |key| match key {
            "KBASE_API_URL" => Some("http://env:9000/api/".to_string()),
            "KBASE_LOG" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "http://env:9000/api");
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = parse_config("[api\nbase_url = 1").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config.toml"));
    }
}
