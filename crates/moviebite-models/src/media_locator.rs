use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::media::MediaType;

/// Addresses one playable unit: a movie, or a single episode of a show or anime.
///
/// The resume-progress map is keyed by [`MediaLocator::key`], which is the only
/// place the string form is produced. Parsing accepts the canonical form and the
/// older `movie-<id>-` form with a trailing dash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaLocator {
    Movie { id: u64 },
    TvEpisode { id: u64, season: u32, episode: u32 },
    AnimeEpisode { id: u64, episode: u32 },
}

impl MediaLocator {
    pub fn movie(id: u64) -> Self {
        MediaLocator::Movie { id }
    }

    pub fn tv_episode(id: u64, season: u32, episode: u32) -> Self {
        MediaLocator::TvEpisode { id, season, episode }
    }

    pub fn anime_episode(id: u64, episode: u32) -> Self {
        MediaLocator::AnimeEpisode { id, episode }
    }

    pub fn id(&self) -> u64 {
        match self {
            MediaLocator::Movie { id }
            | MediaLocator::TvEpisode { id, .. }
            | MediaLocator::AnimeEpisode { id, .. } => *id,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            MediaLocator::Movie { .. } => MediaType::Movie,
            MediaLocator::TvEpisode { .. } => MediaType::Tv,
            MediaLocator::AnimeEpisode { .. } => MediaType::Anime,
        }
    }

    /// Deterministic storage key: `movie-<id>`, `tv-<id>-<season>-<episode>`,
    /// `anime-<id>-<episode>`.
    pub fn key(&self) -> String {
        match self {
            MediaLocator::Movie { id } => format!("movie-{}", id),
            MediaLocator::TvEpisode { id, season, episode } => {
                format!("tv-{}-{}-{}", id, season, episode)
            }
            MediaLocator::AnimeEpisode { id, episode } => format!("anime-{}-{}", id, episode),
        }
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorParseError {
    input: String,
    reason: &'static str,
}

impl LocatorParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl fmt::Display for LocatorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid media locator '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for LocatorParseError {}

impl FromStr for MediaLocator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy movie keys carry an empty trailing segment
        let parts: Vec<&str> = s.trim().trim_end_matches('-').split('-').collect();
        let kind = parts.first().copied().unwrap_or_default();

        let number = |idx: usize| -> Result<u64, LocatorParseError> {
            parts
                .get(idx)
                .ok_or_else(|| LocatorParseError::new(s, "missing segment"))?
                .parse::<u64>()
                .map_err(|_| LocatorParseError::new(s, "segment is not a number"))
        };
        let small = |idx: usize| -> Result<u32, LocatorParseError> {
            u32::try_from(number(idx)?).map_err(|_| LocatorParseError::new(s, "segment out of range"))
        };

        let (locator, expected_len) = match kind {
            "movie" => (MediaLocator::movie(number(1)?), 2),
            "tv" => (MediaLocator::tv_episode(number(1)?, small(2)?, small(3)?), 4),
            "anime" => (MediaLocator::anime_episode(number(1)?, small(2)?), 3),
            _ => return Err(LocatorParseError::new(s, "unknown media kind")),
        };

        if parts.len() != expected_len {
            return Err(LocatorParseError::new(s, "unexpected number of segments"));
        }

        Ok(locator)
    }
}

impl TryFrom<String> for MediaLocator {
    type Error = LocatorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaLocator> for String {
    fn from(locator: MediaLocator) -> Self {
        locator.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(MediaLocator::movie(123).key(), "movie-123");
        assert_eq!(MediaLocator::tv_episode(1396, 2, 5).key(), "tv-1396-2-5");
        assert_eq!(MediaLocator::anime_episode(55, 3).key(), "anime-55-3");
    }

    #[test]
    fn test_parse_canonical_keys() {
        assert_eq!("tv-1396-2-5".parse::<MediaLocator>().unwrap(), MediaLocator::tv_episode(1396, 2, 5));
        assert_eq!("anime-55-3".parse::<MediaLocator>().unwrap(), MediaLocator::anime_episode(55, 3));
    }

    #[test]
    fn test_parse_legacy_movie_key() {
        let locator: MediaLocator = "movie-123-".parse().unwrap();
        assert_eq!(locator, MediaLocator::movie(123));
        assert_eq!(locator.key(), "movie-123");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!("movie".parse::<MediaLocator>().is_err());
        assert!("tv-1396-2".parse::<MediaLocator>().is_err());
        assert!("anime-55-3-1".parse::<MediaLocator>().is_err());
        assert!("podcast-1".parse::<MediaLocator>().is_err());
        assert!("movie-abc".parse::<MediaLocator>().is_err());
    }

    #[test]
    fn test_same_id_different_kinds_do_not_collide() {
        let movie = MediaLocator::movie(42);
        let anime = MediaLocator::anime_episode(42, 1);
        assert_eq!(movie.id(), anime.id());
        assert_ne!(movie.key(), anime.key());
        assert_eq!(anime.media_type(), MediaType::Anime);
    }

    #[test]
    fn test_serde_uses_key_string() {
        let json = serde_json::to_string(&MediaLocator::tv_episode(1, 1, 2)).unwrap();
        assert_eq!(json, "\"tv-1-1-2\"");
        let back: MediaLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MediaLocator::tv_episode(1, 1, 2));
    }
}
