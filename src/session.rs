//! Session context shared by the HTTP adapter and the screens.
//!
//! The session is persisted as a flat JSON object with three string keys so
//! it survives restarts. Only the presence of an access token decides whether
//! the user is signed in; expiry is left to the server.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::data_dir;
use crate::model::user::User;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

/// Persistent key/value storage backing the session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::at(data_dir().join("session.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_default())
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;

        // Tokens are readable by the owner only; the rename swaps the file in whole.
        let tmp = self.path.with_extension("json.tmp");
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut values = self.read()?;
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        self.write(&values)
    }

    pub fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.read()?;
        for key in keys {
            values.remove(*key);
        }
        self.write(&values)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

pub struct Session {
    store: SessionStore,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn load(store: SessionStore) -> Result<Self> {
        let values = store.read()?;
        let user = values.get(USER_KEY).and_then(|raw| {
            serde_json::from_str::<User>(raw)
                .map_err(|e| tracing::warn!("Ignoring unreadable cached user: {e}"))
                .ok()
        });
        let state = SessionState {
            access_token: values.get(ACCESS_TOKEN_KEY).cloned(),
            refresh_token: values.get(REFRESH_TOKEN_KEY).cloned(),
            user,
        };
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Signs in: stores both tokens and the user profile.
    pub fn establish(&self, access_token: &str, refresh_token: &str, user: &User) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.to_string()),
            (REFRESH_TOKEN_KEY, refresh_token.to_string()),
            (USER_KEY, user_json),
        ])?;
        *self.write() = SessionState {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            user: Some(user.clone()),
        };
        tracing::info!(username = %user.username, "Session established");
        Ok(())
    }

    /// Replaces the access token and profile after a token refresh.
    pub fn refreshed(&self, access_token: &str, user: &User) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.to_string()),
            (USER_KEY, user_json),
        ])?;
        let mut state = self.write();
        state.access_token = Some(access_token.to_string());
        state.user = Some(user.clone());
        tracing::info!(username = %user.username, "Session refreshed");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])?;
        *self.write() = SessionState::default();
        tracing::info!("Session cleared");
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }
}

#[cfg(test)]
pub(crate) fn temp_session() -> (tempfile::TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::at(dir.path().join("session.json"));
    let session = Session::load(store).unwrap();
    (dir, session)
}
