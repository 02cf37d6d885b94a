use super::Store;
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use moviebite_config::ResumeConfig;
use moviebite_core::{
    format_resume_time, KeyValueStorage, PersonalizationStore, ResumePrompt, ResumeWrite, SaveThrottle,
};
use moviebite_models::{MediaLocator, WatchHistoryEntry};
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct PlaySession {
    pub locator: MediaLocator,
    pub duration: f64,
    pub start: Option<f64>,
    pub speed: f64,
    pub title: Option<String>,
    pub poster: Option<String>,
    pub genres: Vec<u32>,
}

enum StopReason {
    Finished,
    Interrupted,
}

pub async fn run_play(session: PlaySession, store: &mut Store, config: &ResumeConfig, output: &Output) -> Result<()> {
    if !(session.duration.is_finite() && session.duration > 0.0) {
        return Err(eyre!("--duration must be a positive number of seconds"));
    }
    if !(session.speed.is_finite() && session.speed > 0.0) {
        return Err(eyre!("--speed must be a positive number"));
    }
    if session.start.is_some_and(|start| !start.is_finite()) {
        return Err(eyre!("--start must be a number of seconds"));
    }

    let locator = session.locator;

    if let Some(title) = session.title {
        let mut entry = WatchHistoryEntry::new(locator.id(), title, locator.media_type(), Utc::now())
            .with_genres(session.genres);
        if let Some(poster) = session.poster {
            entry = entry.with_poster(poster);
        }
        store
            .add_to_watch_history(entry)
            .wrap_err("Failed to save watch history")?;
    }

    let position = match session.start {
        Some(start) => start.clamp(0.0, session.duration),
        None => {
            let stored = store
                .get_resume_progress(&locator)
                .and_then(|point| ResumePrompt::from_point(&point, config.min_visible_seconds));
            match stored {
                Some(prompt) => {
                    output.info(format!("Continue watching: {}", prompt.label));
                    prompt.timestamp_seconds.min(session.duration)
                }
                None => 0.0,
            }
        }
    };

    info!(
        operation = "play_start",
        locator = %locator,
        position,
        duration = session.duration,
        "Starting playback session"
    );
    output.info(format!(
        "Playing {} from {} (Ctrl-C to stop)",
        locator,
        format_resume_time(position)
    ));

    let throttle = SaveThrottle::new(Duration::from_secs(config.save_interval_seconds));
    let playback = Playback {
        locator: &locator,
        position,
        duration: session.duration,
        speed: session.speed,
    };
    let (reason, position) = drive(store, playback, throttle, tokio::signal::ctrl_c()).await?;
    info!(operation = "play_stop", locator = %locator, position, "Playback session ended");

    match reason {
        StopReason::Finished => output.success(format!("Finished {}", locator)),
        StopReason::Interrupted => output.success(format!(
            "Stopped {} at {}",
            locator,
            format_resume_time(position)
        )),
    }
    Ok(())
}

struct Playback<'a> {
    locator: &'a MediaLocator,
    position: f64,
    duration: f64,
    speed: f64,
}

/// Advance playback once per second until the end or `shutdown` resolves,
/// saving through `throttle` and once more when the session stops.
///
/// A shutdown future that fails (no signal handler) is logged and ignored.
async fn drive<S, F>(
    store: &mut PersonalizationStore<S>,
    playback: Playback<'_>,
    mut throttle: SaveThrottle,
    shutdown: F,
) -> Result<(StopReason, f64)>
where
    S: KeyValueStorage,
    F: Future<Output = io::Result<()>>,
{
    let Playback { locator, mut position, duration, speed } = playback;

    // The starting position is already stored or is zero
    throttle.mark_saved(Instant::now());

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    tokio::pin!(shutdown);
    let mut listening = true;

    let reason = loop {
        tokio::select! {
            _ = ticker.tick() => {
                position = (position + speed).min(duration);
                if position >= duration {
                    break StopReason::Finished;
                }
                if throttle.should_save(Instant::now()) {
                    debug!(operation = "play_tick_save", locator = %locator, position);
                    save(store, locator, position, duration)?;
                }
            }
            signal = &mut shutdown, if listening => {
                match signal {
                    Ok(()) => break StopReason::Interrupted,
                    Err(e) => {
                        warn!("Failed to listen for Ctrl-C, playback runs to the end: {}", e);
                        listening = false;
                    }
                }
            }
        }
    };

    save(store, locator, position, duration)?;
    Ok((reason, position))
}

fn save<S: KeyValueStorage>(
    store: &mut PersonalizationStore<S>,
    locator: &MediaLocator,
    position: f64,
    duration: f64,
) -> Result<()> {
    let write = store
        .save_resume_progress_at(locator, position, duration, Utc::now())
        .wrap_err("Failed to save resume progress")?;
    if write == ResumeWrite::Stale {
        warn!(locator = %locator, "Another player saved newer progress, keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebite_config::StoreConfig;
    use moviebite_core::MemoryStorage;

    fn open_store() -> PersonalizationStore<MemoryStorage> {
        PersonalizationStore::open(MemoryStorage::new(), &StoreConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_handler_plays_to_the_end() {
        let mut store = open_store();
        let locator = MediaLocator::movie(603);
        let playback = Playback { locator: &locator, position: 0.0, duration: 3.0, speed: 1.0 };
        let shutdown = std::future::ready(Err(io::Error::new(io::ErrorKind::Other, "no signal handler")));

        let (reason, position) = drive(&mut store, playback, SaveThrottle::new(Duration::from_secs(30)), shutdown)
            .await
            .unwrap();

        assert!(matches!(reason, StopReason::Finished));
        assert_eq!(position, 3.0);
        assert_eq!(store.get_resume_progress(&locator).unwrap().timestamp_seconds, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_saves_current_position() {
        let mut store = open_store();
        let locator = MediaLocator::tv_episode(1396, 1, 3);
        let playback = Playback { locator: &locator, position: 100.0, duration: 3000.0, speed: 1.0 };

        let (reason, position) = drive(&mut store, playback, SaveThrottle::new(Duration::from_secs(30)), async { Ok(()) })
            .await
            .unwrap();

        assert!(matches!(reason, StopReason::Interrupted));
        assert_eq!(position, 100.0);
        assert_eq!(store.get_resume_progress(&locator).unwrap().timestamp_seconds, 100.0);
    }
}
