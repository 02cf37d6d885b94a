use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::media::{record_title, MediaType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "StoredWatchHistoryEntry")]
pub struct WatchHistoryEntry {
    pub id: u64,
    pub title: String,
    pub media_type: MediaType,
    pub poster_path: Option<String>,
    #[serde(rename = "watchedAt")]
    pub watched_at: DateTime<Utc>,
    pub genres: BTreeSet<u32>, // Genre ids, order irrelevant
}

#[derive(Deserialize)]
struct StoredWatchHistoryEntry {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    media_type: MediaType,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(rename = "watchedAt")]
    watched_at: DateTime<Utc>,
    #[serde(default)]
    genres: BTreeSet<u32>,
}

impl TryFrom<StoredWatchHistoryEntry> for WatchHistoryEntry {
    type Error = String;

    fn try_from(stored: StoredWatchHistoryEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: stored.id,
            title: record_title(stored.id, stored.title, stored.name)?,
            media_type: stored.media_type,
            poster_path: stored.poster_path,
            watched_at: stored.watched_at,
            genres: stored.genres,
        })
    }
}

impl WatchHistoryEntry {
    pub fn new(id: u64, title: impl Into<String>, media_type: MediaType, watched_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            media_type,
            poster_path: None,
            watched_at,
            genres: BTreeSet::new(),
        }
    }

    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = u32>) -> Self {
        self.genres = genres.into_iter().collect();
        self
    }

    pub fn same_media(&self, other: &WatchHistoryEntry) -> bool {
        self.id == other.id && self.media_type == other.media_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entry_accepts_name() {
        let raw = r#"{"id":1396,"name":"Breaking Bad","media_type":"tv","poster_path":null,"watchedAt":"2024-03-01T10:00:00Z","genres":[18,80]}"#;
        let entry: WatchHistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.title, "Breaking Bad");
        assert_eq!(entry.genres, BTreeSet::from([18, 80]));
    }
}
