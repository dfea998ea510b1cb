use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamp::Timestamp;
use super::user::User;

/// Where a knowledge item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Github,
    Jira,
    Gitlab,
    Manual,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::Github,
        SourceType::Jira,
        SourceType::Gitlab,
        SourceType::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Github => "GITHUB",
            SourceType::Jira => "JIRA",
            SourceType::Gitlab => "GITLAB",
            SourceType::Manual => "MANUAL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceType::Github => "GitHub",
            SourceType::Jira => "JIRA",
            SourceType::Gitlab => "GitLab",
            SourceType::Manual => "Manual",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source type: {s}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Item metadata, shaped by the item's source type. Keys the client does not
/// know about are kept in `extra` so they survive an edit round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemMetadata {
    GitHub(GitHubMetadata),
    Jira(JiraMetadata),
    GitLab(GitLabMetadata),
    Manual(BTreeMap<String, Value>),
}

impl ItemMetadata {
    /// Builds the typed shape for `source_type`. A payload whose known keys
    /// carry unexpected types is kept verbatim in `extra`.
    pub fn from_wire(source_type: SourceType, map: Map<String, Value>) -> Self {
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

        match source_type {
            SourceType::Github => {
                ItemMetadata::GitHub(typed(map, |m: &mut GitHubMetadata| &mut m.extra))
            }
            SourceType::Jira => ItemMetadata::Jira(typed(map, |m: &mut JiraMetadata| &mut m.extra)),
            SourceType::Gitlab => {
                ItemMetadata::GitLab(typed(map, |m: &mut GitLabMetadata| &mut m.extra))
            }
            SourceType::Manual => ItemMetadata::Manual(map.into_iter().collect()),
        }
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let value = match self {
            ItemMetadata::GitHub(m) => serde_json::to_value(m),
            ItemMetadata::Jira(m) => serde_json::to_value(m),
            ItemMetadata::GitLab(m) => serde_json::to_value(m),
            ItemMetadata::Manual(extra) => serde_json::to_value(extra),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_wire().is_empty()
    }

    /// Flattened `key: value` pairs for display, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.to_wire()
            .into_iter()
            .map(|(k, v)| {
                let shown = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, shown)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawKnowledgeItem")]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    pub metadata: ItemMetadata,
    pub author_id: Option<String>,
    pub author: Option<User>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKnowledgeItem {
    id: String,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default = "manual")]
    source_type: SourceType,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    author: Option<User>,
    #[serde(default)]
    created_at: Option<Timestamp>,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

fn manual() -> SourceType {
    SourceType::Manual
}

impl From<RawKnowledgeItem> for KnowledgeItem {
    fn from(raw: RawKnowledgeItem) -> Self {
        let metadata = ItemMetadata::from_wire(raw.source_type, raw.metadata.unwrap_or_default());
        Self {
            id: raw.id,
            title: raw.title,
            content: raw.content,
            summary: raw.summary.filter(|s| !s.trim().is_empty()),
            source_type: raw.source_type,
            source_id: raw.source_id,
            source_url: raw.source_url.filter(|s| !s.trim().is_empty()),
            tags: raw.tags,
            metadata,
            author_id: raw.author_id,
            author: raw.author,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

impl KnowledgeItem {
    /// Summary if present, otherwise the first 200 characters of the content.
    pub fn excerpt(&self) -> String {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(200).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Body of create and update calls: the writable subset of an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeInput {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, title: &str) -> KnowledgeItem {
    KnowledgeItem {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("Content of {title}"),
        summary: None,
        source_type: SourceType::Manual,
        source_id: None,
        source_url: None,
        tags: vec![],
        metadata: ItemMetadata::Manual(BTreeMap::new()),
        author_id: Some("user-1".into()),
        author: None,
        created_at: None,
        updated_at: None,
    }
}
