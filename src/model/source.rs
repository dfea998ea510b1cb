use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    Github,
    Jira,
    Gitlab,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Github, SourceKind::Jira, SourceKind::Gitlab];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Github => "GITHUB",
            SourceKind::Jira => "JIRA",
            SourceKind::Gitlab => "GITLAB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Github => "GitHub",
            SourceKind::Jira => "JIRA",
            SourceKind::Gitlab => "GitLab",
        }
    }

    pub fn next(&self) -> SourceKind {
        match self {
            SourceKind::Github => SourceKind::Jira,
            SourceKind::Jira => SourceKind::Gitlab,
            SourceKind::Gitlab => SourceKind::Github,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source kind: {s}"))
    }
}

/// Describes one configuration field of a source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigField {
    /// Wire key inside `configuration`.
    pub key: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub required: bool,
    pub secret: bool,
}

const GITHUB_FIELDS: &[ConfigField] = &[
    ConfigField {
        key: "token",
        label: "GitHub Token",
        help: "Personal access token with repo and read:org permissions",
        required: true,
        secret: true,
    },
    ConfigField {
        key: "owner",
        label: "Repository Owner/Organization",
        help: "GitHub username or organization name",
        required: true,
        secret: false,
    },
    ConfigField {
        key: "repo",
        label: "Repository Name (optional)",
        help: "Leave empty to sync all repositories in the organization",
        required: false,
        secret: false,
    },
];

const JIRA_FIELDS: &[ConfigField] = &[
    ConfigField {
        key: "url",
        label: "JIRA URL",
        help: "Your JIRA instance URL, e.g. https://yourcompany.atlassian.net",
        required: true,
        secret: false,
    },
    ConfigField {
        key: "username",
        label: "Username/Email",
        help: "Your JIRA username or email address",
        required: true,
        secret: false,
    },
    ConfigField {
        key: "token",
        label: "API Token",
        help: "JIRA API token",
        required: true,
        secret: true,
    },
    ConfigField {
        key: "projectKey",
        label: "Project Key",
        help: "JIRA project key (e.g. PROJ)",
        required: true,
        secret: false,
    },
];

const GITLAB_FIELDS: &[ConfigField] = &[
    ConfigField {
        key: "url",
        label: "GitLab URL",
        help: "GitLab instance URL (use https://gitlab.com for GitLab.com)",
        required: true,
        secret: false,
    },
    ConfigField {
        key: "token",
        label: "Personal Access Token",
        help: "GitLab personal access token with api scope",
        required: true,
        secret: true,
    },
    ConfigField {
        key: "projectId",
        label: "Project ID or Path",
        help: "GitLab project ID or full path (e.g. group/project)",
        required: true,
        secret: false,
    },
];

/// Accepts any scalar for a text field: `null` reads as blank, numbers and
/// booleans as their JSON text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub repo: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_key: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_id: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Connection settings of a knowledge source, one shape per kind.
///
/// On the wire this is the `type` discriminator plus an open `configuration`
/// object. Keys not listed in the kind's field table land in `extra` and are
/// sent back unchanged on update.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    GitHub(GitHubConfig),
    Jira(JiraConfig),
    GitLab(GitLabConfig),
}

impl SourceConfig {
    pub fn empty(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Github => SourceConfig::GitHub(GitHubConfig::default()),
            SourceKind::Jira => SourceConfig::Jira(JiraConfig::default()),
            SourceKind::Gitlab => SourceConfig::GitLab(GitLabConfig::default()),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::GitHub(_) => SourceKind::Github,
            SourceConfig::Jira(_) => SourceKind::Jira,
            SourceConfig::GitLab(_) => SourceKind::Gitlab,
        }
    }

    pub fn fields(&self) -> &'static [ConfigField] {
        match self {
            SourceConfig::GitHub(_) => GITHUB_FIELDS,
            SourceConfig::Jira(_) => JIRA_FIELDS,
            SourceConfig::GitLab(_) => GITLAB_FIELDS,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        let value = match (self, key) {
            (SourceConfig::GitHub(c), "token") => &c.token,
            (SourceConfig::GitHub(c), "owner") => &c.owner,
            (SourceConfig::GitHub(c), "repo") => &c.repo,
            (SourceConfig::Jira(c), "url") => &c.url,
            (SourceConfig::Jira(c), "username") => &c.username,
            (SourceConfig::Jira(c), "token") => &c.token,
            (SourceConfig::Jira(c), "projectKey") => &c.project_key,
            (SourceConfig::GitLab(c), "url") => &c.url,
            (SourceConfig::GitLab(c), "token") => &c.token,
            (SourceConfig::GitLab(c), "projectId") => &c.project_id,
            _ => return self.extra().get(key).and_then(Value::as_str).unwrap_or(""),
        };
        value.as_str()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let slot = match (&mut *self, key) {
            (SourceConfig::GitHub(c), "token") => &mut c.token,
            (SourceConfig::GitHub(c), "owner") => &mut c.owner,
            (SourceConfig::GitHub(c), "repo") => &mut c.repo,
            (SourceConfig::Jira(c), "url") => &mut c.url,
            (SourceConfig::Jira(c), "username") => &mut c.username,
            (SourceConfig::Jira(c), "token") => &mut c.token,
            (SourceConfig::Jira(c), "projectKey") => &mut c.project_key,
            (SourceConfig::GitLab(c), "url") => &mut c.url,
            (SourceConfig::GitLab(c), "token") => &mut c.token,
            (SourceConfig::GitLab(c), "projectId") => &mut c.project_id,
            _ => {
                self.extra_mut().insert(key.to_string(), Value::String(value));
                return;
            }
        };
        *slot = value;
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        match self {
            SourceConfig::GitHub(c) => &c.extra,
            SourceConfig::Jira(c) => &c.extra,
            SourceConfig::GitLab(c) => &c.extra,
        }
    }

    fn extra_mut(&mut self) -> &mut BTreeMap<String, Value> {
        match self {
            SourceConfig::GitHub(c) => &mut c.extra,
            SourceConfig::Jira(c) => &mut c.extra,
            SourceConfig::GitLab(c) => &mut c.extra,
        }
    }

    /// Labels of required fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|f| f.required && self.get(f.key).trim().is_empty())
            .map(|f| f.label)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Builds the typed shape for `kind`. A payload that still fails to map
    /// is kept verbatim in `extra` so an update sends it back untouched.
    pub fn from_wire(kind: SourceKind, map: Map<String, Value>) -> Self {
        fn typed<T: Default + serde::de::DeserializeOwned>(
            map: Map<String, Value>,
            with_extra: impl FnOnce(&mut T) -> &mut BTreeMap<String, Value>,
        ) -> T {
            match serde_json::from_value::<T>(Value::Object(map.clone())) {
                Ok(value) => value,
                Err(_) => {
                    let mut value = T::default();
                    *with_extra(&mut value) = map.into_iter().collect();
                    value
                }
            }
        }

        match kind {
            SourceKind::Github => {
                SourceConfig::GitHub(typed(map, |c: &mut GitHubConfig| &mut c.extra))
            }
            SourceKind::Jira => SourceConfig::Jira(typed(map, |c: &mut JiraConfig| &mut c.extra)),
            SourceKind::Gitlab => {
                SourceConfig::GitLab(typed(map, |c: &mut GitLabConfig| &mut c.extra))
            }
        }
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let value = match self {
            SourceConfig::GitHub(c) => serde_json::to_value(c),
            SourceConfig::Jira(c) => serde_json::to_value(c),
            SourceConfig::GitLab(c) => serde_json::to_value(c),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Human-readable `(label, value)` rows with secrets masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.fields()
            .iter()
            .map(|f| {
                let raw = self.get(f.key).trim();
                let shown = if f.secret {
                    let status = if raw.is_empty() { "Not configured" } else { "Configured" };
                    status.to_string()
                } else if raw.is_empty() {
                    match (self.kind(), f.key) {
                        (SourceKind::Github, "repo") => "All repositories".to_string(),
                        _ => "Not configured".to_string(),
                    }
                } else {
                    raw.to_string()
                };
                (f.label, shown)
            })
            .collect()
    }

    /// Short label for list cards, e.g. `octo-org/widgets` or `OPS`.
    pub fn headline(&self) -> String {
        match self {
            SourceConfig::GitHub(c) if c.repo.is_empty() => c.owner.clone(),
            SourceConfig::GitHub(c) => format!("{}/{}", c.owner, c.repo),
            SourceConfig::Jira(c) => c.project_key.clone(),
            SourceConfig::GitLab(c) => c.project_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawKnowledgeSource")]
pub struct KnowledgeSource {
    pub id: String,
    pub config: SourceConfig,
    pub is_active: bool,
    pub last_sync: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl KnowledgeSource {
    pub fn kind(&self) -> SourceKind {
        self.config.kind()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKnowledgeSource {
    id: String,
    #[serde(rename = "type")]
    kind: SourceKind,
    #[serde(default)]
    configuration: Option<Map<String, Value>>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    last_sync: Option<Timestamp>,
    #[serde(default)]
    created_at: Option<Timestamp>,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

impl From<RawKnowledgeSource> for KnowledgeSource {
    fn from(raw: RawKnowledgeSource) -> Self {
        Self {
            id: raw.id,
            config: SourceConfig::from_wire(raw.kind, raw.configuration.unwrap_or_default()),
            is_active: raw.is_active,
            last_sync: raw.last_sync,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// Body of the create and test-connection calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSourceRequest {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub configuration: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateSourceRequest {
    pub fn new(config: &SourceConfig, is_active: bool) -> Self {
        Self {
            kind: config.kind(),
            configuration: config.to_wire(),
            is_active: Some(is_active),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSourceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_source(id: &str, kind: SourceKind) -> KnowledgeSource {
    let mut config = SourceConfig::empty(kind);
    for field in config.fields() {
        config.set(field.key, format!("{}-{id}", field.key));
    }
    KnowledgeSource {
        id: id.to_string(),
        config,
        is_active: true,
        last_sync: None,
        created_at: None,
        updated_at: None,
    }
}
