//! Read-side helpers for consumers of the store.
//!
//! None of these touch storage: they shape what the store already holds into
//! what a "continue watching" row or a suggestions shelf needs.

use moviebite_models::{ResumePoint, ResumeProgress, WatchHistoryEntry};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// The `count` most frequent genre ids across `history`.
///
/// Ties go to the lower genre id so the result is stable.
pub fn top_genres(history: &[WatchHistoryEntry], count: usize) -> Vec<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for entry in history {
        for genre in &entry.genres {
            *counts.entry(*genre).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(u32, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a_id, a_count), (b_id, b_count)| b_count.cmp(a_count).then(a_id.cmp(b_id)));
    ranked.into_iter().take(count).map(|(id, _)| id).collect()
}

/// "1h 5m" above an hour, "12m" below
pub fn format_resume_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// What a "continue watching" banner shows for one stored offset.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResumePrompt {
    pub timestamp_seconds: f64,
    /// `None` when the player never reported a duration
    pub percent_complete: Option<f64>,
    pub label: String,
}

impl ResumePrompt {
    /// `None` when the offset is too short to be worth offering.
    pub fn from_point(point: &ResumePoint, min_visible_seconds: f64) -> Option<Self> {
        if point.timestamp_seconds < min_visible_seconds {
            return None;
        }

        let percent_complete = (point.duration_seconds > 0.0)
            .then(|| (point.timestamp_seconds / point.duration_seconds * 100.0).clamp(0.0, 100.0));

        Some(Self {
            timestamp_seconds: point.timestamp_seconds,
            percent_complete,
            label: format!("Resume from {}", format_resume_time(point.timestamp_seconds)),
        })
    }
}

/// Stored offsets worth offering, most recently watched first
pub fn continue_watching(
    progress: &BTreeMap<String, ResumeProgress>,
    min_visible_seconds: f64,
) -> Vec<(String, ResumeProgress, ResumePrompt)> {
    let mut rows: Vec<(String, ResumeProgress, ResumePrompt)> = progress
        .iter()
        .filter_map(|(key, value)| {
            ResumePrompt::from_point(&value.point(), min_visible_seconds)
                .map(|prompt| (key.clone(), value.clone(), prompt))
        })
        .collect();
    rows.sort_by(|a, b| b.1.last_watched_at.cmp(&a.1.last_watched_at));
    rows
}

/// Rate limit for periodic resume saves.
///
/// Players tick far more often than the store should be written; a save goes
/// through on the first tick and then at most once per interval, unless forced
/// (seek, pause, stop).
#[derive(Debug, Clone)]
pub struct SaveThrottle {
    interval: Duration,
    last_saved: Option<Instant>,
}

impl SaveThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_saved: None,
        }
    }

    /// Whether a save should happen at `now`; records it when it should
    pub fn should_save(&mut self, now: Instant) -> bool {
        let due = match self.last_saved {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_saved = Some(now);
        }
        due
    }

    /// Record an out-of-band save so the next periodic one waits a full interval
    pub fn mark_saved(&mut self, now: Instant) {
        self.last_saved = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use moviebite_models::MediaType;

    fn history_entry(id: u64, genres: &[u32]) -> WatchHistoryEntry {
        WatchHistoryEntry::new(id, format!("Title {}", id), MediaType::Movie, Utc::now())
            .with_genres(genres.iter().copied())
    }

    #[test]
    fn test_top_genres_orders_by_frequency() {
        let history = vec![
            history_entry(1, &[28, 12]),
            history_entry(2, &[28, 35]),
            history_entry(3, &[35, 28, 18]),
            history_entry(4, &[]),
        ];
        assert_eq!(top_genres(&history, 3), vec![28, 35, 12]);
        assert_eq!(top_genres(&history, 1), vec![28]);
        assert!(top_genres(&[], 3).is_empty());
    }

    #[test]
    fn test_format_resume_time() {
        assert_eq!(format_resume_time(59.0), "0m");
        assert_eq!(format_resume_time(754.0), "12m");
        assert_eq!(format_resume_time(3900.0), "1h 5m");
        assert_eq!(format_resume_time(f64::NAN), "0m");
    }

    #[test]
    fn test_resume_prompt_hides_short_progress() {
        let point = ResumePoint { timestamp_seconds: 29.0, duration_seconds: 600.0 };
        assert!(ResumePrompt::from_point(&point, 30.0).is_none());

        let point = ResumePoint { timestamp_seconds: 300.0, duration_seconds: 600.0 };
        let prompt = ResumePrompt::from_point(&point, 30.0).unwrap();
        assert_eq!(prompt.percent_complete, Some(50.0));
        assert_eq!(prompt.label, "Resume from 5m");
    }

    #[test]
    fn test_resume_prompt_without_duration() {
        let point = ResumePoint { timestamp_seconds: 120.0, duration_seconds: 0.0 };
        let prompt = ResumePrompt::from_point(&point, 30.0).unwrap();
        assert_eq!(prompt.percent_complete, None);
    }

    #[test]
    fn test_continue_watching_most_recent_first() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        let mut progress = BTreeMap::new();
        progress.insert(
            "movie-1".to_string(),
            ResumeProgress { timestamp_seconds: 600.0, duration_seconds: 6000.0, last_watched_at: base },
        );
        progress.insert(
            "tv-2-1-1".to_string(),
            ResumeProgress {
                timestamp_seconds: 90.0,
                duration_seconds: 1500.0,
                last_watched_at: base + ChronoDuration::hours(1),
            },
        );
        progress.insert(
            "anime-3-1".to_string(),
            ResumeProgress {
                timestamp_seconds: 10.0,
                duration_seconds: 1400.0,
                last_watched_at: base + ChronoDuration::hours(2),
            },
        );

        let rows = continue_watching(&progress, 30.0);
        let keys: Vec<&str> = rows.iter().map(|(k, _, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["tv-2-1-1", "movie-1"]);
    }

    #[test]
    fn test_save_throttle_interval() {
        let start = Instant::now();
        let mut throttle = SaveThrottle::new(Duration::from_secs(30));

        assert!(throttle.should_save(start));
        assert!(!throttle.should_save(start + Duration::from_secs(10)));
        assert!(!throttle.should_save(start + Duration::from_secs(29)));
        assert!(throttle.should_save(start + Duration::from_secs(30)));

        throttle.mark_saved(start + Duration::from_secs(45));
        assert!(!throttle.should_save(start + Duration::from_secs(60)));
        assert!(throttle.should_save(start + Duration::from_secs(75)));
    }
}
