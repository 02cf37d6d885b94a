use moviebite_models::{ResumeProgress, WatchHistoryEntry, WatchLaterEntry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All three collections together, keyed the way browser local storage keys them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(rename = "watchLater", default)]
    pub watch_later: Vec<WatchLaterEntry>,
    #[serde(rename = "watchHistory", default)]
    pub watch_history: Vec<WatchHistoryEntry>,
    #[serde(rename = "resumeProgress", default)]
    pub resume_progress: BTreeMap<String, ResumeProgress>,
}

impl Snapshot {
    /// Parse an exported snapshot.
    ///
    /// Each collection may be inline JSON or a JSON-encoded string, which is
    /// how a raw dump of browser local storage stores its values.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(input)?;
        Ok(Self {
            watch_later: field(&root, "watchLater")?,
            watch_history: field(&root, "watchHistory")?,
            resume_progress: field(&root, "resumeProgress")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.watch_later.is_empty() && self.watch_history.is_empty() && self.resume_progress.is_empty()
    }
}

fn field<T>(root: &serde_json::Map<String, serde_json::Value>, key: &str) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    match root.get(key) {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(serde_json::Value::String(encoded)) => serde_json::from_str(encoded),
        Some(value) => T::deserialize(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebite_models::MediaType;

    #[test]
    fn test_parse_browser_dump_with_string_values() {
        let dump = r#"{
            "watchLater": "[{\"id\":42,\"title\":\"X\",\"poster_path\":\"/x.jpg\",\"media_type\":\"movie\",\"addedAt\":\"2024-03-01T10:00:00.000Z\",\"vote_average\":7.1}]",
            "resumeProgress": "{\"movie-42-\":{\"timestamp\":95,\"duration\":6000,\"lastWatched\":\"2024-03-02T10:00:00.000Z\"}}"
        }"#;

        let snapshot = Snapshot::from_json_str(dump).unwrap();
        assert_eq!(snapshot.watch_later.len(), 1);
        assert_eq!(snapshot.watch_later[0].media_type, MediaType::Movie);
        assert!(snapshot.watch_history.is_empty());
        assert_eq!(snapshot.resume_progress["movie-42-"].timestamp_seconds, 95.0);
    }

    #[test]
    fn test_parse_browser_dump_with_tv_bookmark() {
        let dump = r#"{
            "watchLater": "[{\"id\":603,\"title\":\"The Matrix\",\"poster_path\":\"/matrix.jpg\",\"media_type\":\"movie\",\"addedAt\":\"2024-03-01T10:00:00.000Z\"},{\"id\":1396,\"name\":\"Breaking Bad\",\"overview\":\"A chemistry teacher turned meth cook.\",\"genre_ids\":[18,80],\"poster_path\":\"/bb.jpg\",\"media_type\":\"tv\",\"addedAt\":\"2024-03-02T10:00:00.000Z\"}]"
        }"#;

        let snapshot = Snapshot::from_json_str(dump).unwrap();
        assert_eq!(snapshot.watch_later.len(), 2);
        assert_eq!(snapshot.watch_later[1].title, "Breaking Bad");
        assert_eq!(snapshot.watch_later[1].media_type, MediaType::Tv);
    }

    #[test]
    fn test_parse_inline_snapshot() {
        let json = r#"{
            "watchHistory": [{"id":1396,"title":"Breaking Bad","media_type":"tv","poster_path":null,"watchedAt":"2024-03-01T10:00:00Z","genres":[18,80]}]
        }"#;
        let snapshot = Snapshot::from_json_str(json).unwrap();
        assert_eq!(snapshot.watch_history.len(), 1);
        assert!(snapshot.watch_history[0].genres.contains(&80));
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(Snapshot::from_json_str("[1, 2, 3]").is_err());
    }
}
