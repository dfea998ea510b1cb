use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl User {
    /// First name when known, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// `Ada Lovelace (ada)`, or just the username when no names are set.
    pub fn full_name(&self) -> String {
        let names: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|n| !n.trim().is_empty())
            .collect();
        if names.is_empty() {
            self.username.clone()
        } else {
            format!("{} ({})", names.join(" "), self.username)
        }
    }

    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

#[cfg(test)]
pub(crate) fn sample_user(username: &str) -> User {
    User {
        id: format!("user-{username}"),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: None,
        last_name: None,
        roles: vec!["USER".into()],
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_first_name() {
        let mut user = sample_user("ada");
        assert_eq!(user.display_name(), "ada");
        user.first_name = Some("Ada".into());
        assert_eq!(user.display_name(), "Ada");
        user.first_name = Some("  ".into());
        assert_eq!(user.display_name(), "ada");
    }

    #[test]
    fn full_name_includes_username() {
        let mut user = sample_user("ada");
        assert_eq!(user.full_name(), "ada");
        user.first_name = Some("Ada".into());
        user.last_name = Some("Lovelace".into());
        assert_eq!(user.full_name(), "Ada Lovelace (ada)");
        assert_eq!(user.initial(), 'A');
    }

    #[test]
    fn deserializes_minimal_payload() {
        let json = r#"{"id":"1","username":"bob","email":"bob@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.roles.is_empty());
        assert_eq!(user.first_name, None);
        let back = serde_json::to_string(&user).unwrap();
        assert!(!back.contains("firstName"));
    }
}
