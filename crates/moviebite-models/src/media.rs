use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog namespace a media id belongs to.
///
/// Ids are only unique within one namespace: TMDB movie 42, TMDB show 42 and
/// AniList anime 42 are three different titles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Anime,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Anime => "anime",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaType::Movie),
            "tv" | "show" | "series" => Ok(MediaType::Tv),
            "anime" => Ok(MediaType::Anime),
            _ => Err(format!("Invalid media type: {}. Use 'movie', 'tv', or 'anime'", s)),
        }
    }
}

/// Minimal identity plus display fields for a catalog item.
///
/// Title and poster are copied when the item is stored and are never
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRef {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MediaRef {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
        }
    }

    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }
}

/// Display title of a stored catalog record.
///
/// Movies carry `title`, TMDB shows only `name`; `title` wins when both exist.
pub(crate) fn record_title(id: u64, title: Option<String>, name: Option<String>) -> Result<String, String> {
    title
        .or(name)
        .ok_or_else(|| format!("record {} has neither `title` nor `name`", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MediaType::Tv).unwrap(), "\"tv\"");
        let parsed: MediaType = serde_json::from_str("\"anime\"").unwrap();
        assert_eq!(parsed, MediaType::Anime);
    }

    #[test]
    fn test_media_type_from_str() {
        assert_eq!("Movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!("series".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert!("music".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_record_title_falls_back_to_name() {
        assert_eq!(record_title(1, Some("The Matrix".into()), None).unwrap(), "The Matrix");
        assert_eq!(record_title(2, None, Some("Breaking Bad".into())).unwrap(), "Breaking Bad");
        assert_eq!(record_title(3, Some("Title".into()), Some("Name".into())).unwrap(), "Title");
        assert!(record_title(4, None, None).is_err());
    }
}
