use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A server timestamp. The API emits RFC 3339 strings, but some deployments
/// drop the offset, so naive values are read as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// `Mar 04, 2024`
    pub fn date(&self) -> String {
        self.0.format("%b %d, %Y").to_string()
    }

    /// `Mar 04, 2024 13:37`
    pub fn date_time(&self) -> String {
        self.0.format("%b %d, %Y %H:%M").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = Timestamp::parse("2024-03-04T13:37:00+02:00").unwrap();
        assert_eq!(ts.date_time(), "Mar 04, 2024 11:37");
    }

    #[test]
    fn parses_naive_as_utc() {
        let ts = Timestamp::parse("2024-03-04T13:37:00.123").unwrap();
        assert_eq!(ts.date(), "Mar 04, 2024");
        assert_eq!(ts.date_time(), "Mar 04, 2024 13:37");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_none());
        let err = serde_json::from_str::<Timestamp>("\"yesterday\"").unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }
}
