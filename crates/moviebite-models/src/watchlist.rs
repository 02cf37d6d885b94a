use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::{record_title, MediaRef, MediaType};

/// Bookmarked item in the watch-later list.
///
/// Field names match the browser local-storage layout so exported lists can
/// be imported as-is. Stored TV records may carry `name` instead of `title`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "StoredWatchLaterEntry")]
pub struct WatchLaterEntry {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub media_type: MediaType,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredWatchLaterEntry {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    media_type: MediaType,
    #[serde(rename = "addedAt")]
    added_at: DateTime<Utc>,
}

impl TryFrom<StoredWatchLaterEntry> for WatchLaterEntry {
    type Error = String;

    fn try_from(stored: StoredWatchLaterEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: stored.id,
            title: record_title(stored.id, stored.title, stored.name)?,
            poster_path: stored.poster_path,
            media_type: stored.media_type,
            added_at: stored.added_at,
        })
    }
}

impl WatchLaterEntry {
    pub fn from_media(item: MediaRef, media_type: MediaType, added_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            title: item.title,
            poster_path: item.poster_path,
            media_type,
            added_at,
        }
    }

    pub fn matches(&self, id: u64, media_type: Option<MediaType>) -> bool {
        self.id == id && media_type.map_or(true, |t| t == self.media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmdb_tv_record_uses_name() {
        let raw = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "overview": "A chemistry teacher turned meth cook.",
            "genre_ids": [18, 80],
            "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
            "media_type": "tv",
            "addedAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let entry: WatchLaterEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.title, "Breaking Bad");
        assert_eq!(entry.media_type, MediaType::Tv);

        // Written back with `title`, so the next load does not need the fallback
        let written = serde_json::to_value(&entry).unwrap();
        assert_eq!(written["title"], "Breaking Bad");
        assert!(written.get("name").is_none());
    }

    #[test]
    fn test_record_without_any_title_is_rejected() {
        let raw = r#"{"id": 7, "media_type": "movie", "addedAt": "2024-03-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<WatchLaterEntry>(raw).is_err());
    }
}
