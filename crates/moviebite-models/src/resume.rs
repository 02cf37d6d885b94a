use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored playback offset for one locator.
///
/// `timestamp_seconds` only means something relative to `duration_seconds`
/// recorded with it; a zero duration means the player never reported one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeProgress {
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    #[serde(rename = "lastWatched")]
    pub last_watched_at: DateTime<Utc>,
}

impl ResumeProgress {
    pub fn point(&self) -> ResumePoint {
        ResumePoint {
            timestamp_seconds: self.timestamp_seconds,
            duration_seconds: self.duration_seconds,
        }
    }
}

/// What `get_resume_progress` hands back: the offset without bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResumePoint {
    pub timestamp_seconds: f64,
    pub duration_seconds: f64,
}
