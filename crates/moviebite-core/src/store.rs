use chrono::{DateTime, Utc};
use moviebite_config::{StoreConfig, WriteFailurePolicy};
use moviebite_models::{
    MediaLocator, MediaRef, MediaType, ResumePoint, ResumeProgress, WatchHistoryEntry, WatchLaterEntry,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use crate::error::PersistenceError;
use crate::snapshot::Snapshot;
use crate::storage::KeyValueStorage;


pub const WATCH_LATER_KEY: &str = "watchLater";
pub const WATCH_HISTORY_KEY: &str = "watchHistory";
pub const RESUME_PROGRESS_KEY: &str = "resumeProgress";

/// Outcome of a resume-progress save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeWrite {
    Saved,
    /// The stored entry was observed later than this write; nothing changed
    Stale,
    /// Offset or duration was negative or not a number; nothing changed
    Invalid,
}

/// Watch-later list, watch history and resume progress for one profile.
///
/// Collections are loaded once in [`PersonalizationStore::open`] and every
/// mutation writes the affected collection back to storage before returning.
/// The store is meant to be created once and handed to whatever needs it.
pub struct PersonalizationStore<S: KeyValueStorage> {
    storage: S,
    config: StoreConfig,
    watch_later: Vec<WatchLaterEntry>,
    watch_history: Vec<WatchHistoryEntry>,
    resume_progress: BTreeMap<String, ResumeProgress>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: KeyValueStorage> PersonalizationStore<S> {
    /// Rehydrate from storage. Missing or unreadable values start empty;
    /// individual entries that fail to parse are dropped with a warning.
    pub fn open(storage: S, config: &StoreConfig) -> Self {
        let watch_later: Vec<WatchLaterEntry> = load_list(&storage, WATCH_LATER_KEY);
        let watch_history: Vec<WatchHistoryEntry> = load_list(&storage, WATCH_HISTORY_KEY);
        let resume_progress: BTreeMap<String, ResumeProgress> = load_map(&storage, RESUME_PROGRESS_KEY);

        let mut store = Self {
            storage,
            config: config.clone(),
            watch_later: Vec::new(),
            watch_history: Vec::new(),
            resume_progress: BTreeMap::new(),
            clock: Utc::now,
        };
        store.replace_collections(watch_later, watch_history, resume_progress);

        info!(
            operation = "store_open",
            watch_later = store.watch_later.len(),
            watch_history = store.watch_history.len(),
            resume_progress = store.resume_progress.len(),
            "Loaded personalization store"
        );
        store
    }

    /// Replace the time source used for `addedAt` and `lastWatched` stamps
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn watch_later(&self) -> &[WatchLaterEntry] {
        &self.watch_later
    }

    pub fn watch_history(&self) -> &[WatchHistoryEntry] {
        &self.watch_history
    }

    pub fn resume_progress(&self) -> &BTreeMap<String, ResumeProgress> {
        &self.resume_progress
    }

    // ── Watch later ─────────────────────────────────────────────

    /// Append `item` to the watch-later list, stamped with the current time.
    ///
    /// Returns `Ok(false)` without writing when uniqueness is enforced and the
    /// `(id, media_type)` pair is already bookmarked.
    pub fn add_to_watch_later(&mut self, item: MediaRef, media_type: MediaType) -> Result<bool, PersistenceError> {
        if self.config.enforce_unique_watch_later && self.is_in_watch_later(item.id, Some(media_type)) {
            debug!(
                operation = "watch_later_add",
                id = item.id,
                media_type = %media_type,
                "Already in watch later, skipping"
            );
            return Ok(false);
        }

        let entry = WatchLaterEntry::from_media(item, media_type, (self.clock)());
        debug!(operation = "watch_later_add", id = entry.id, media_type = %media_type, title = %entry.title);
        self.watch_later.push(entry);
        self.flush_watch_later()?;
        Ok(true)
    }

    /// Remove bookmarks for `id`. `None` matches every media type.
    ///
    /// Returns how many entries were removed; removing an absent id is not an error.
    pub fn remove_from_watch_later(&mut self, id: u64, media_type: Option<MediaType>) -> Result<usize, PersistenceError> {
        let before = self.watch_later.len();
        self.watch_later.retain(|entry| !entry.matches(id, media_type));
        let removed = before - self.watch_later.len();

        if removed == 0 {
            debug!(operation = "watch_later_remove", id, "Nothing to remove");
            return Ok(0);
        }

        debug!(operation = "watch_later_remove", id, removed);
        self.flush_watch_later()?;
        Ok(removed)
    }

    /// Membership check. `None` matches every media type.
    pub fn is_in_watch_later(&self, id: u64, media_type: Option<MediaType>) -> bool {
        self.watch_later.iter().any(|entry| entry.matches(id, media_type))
    }

    // ── Watch history ───────────────────────────────────────────

    /// Record a viewing: replaces any entry for the same `(id, media_type)`,
    /// puts it first and drops the oldest entries beyond the history limit.
    pub fn add_to_watch_history(&mut self, entry: WatchHistoryEntry) -> Result<(), PersistenceError> {
        self.watch_history.retain(|existing| !existing.same_media(&entry));
        debug!(operation = "watch_history_add", id = entry.id, media_type = %entry.media_type);
        self.watch_history.insert(0, entry);

        if self.watch_history.len() > self.config.history_limit {
            let evicted = self.watch_history.len() - self.config.history_limit;
            self.watch_history.truncate(self.config.history_limit);
            debug!(operation = "watch_history_evict", evicted);
        }

        self.flush_watch_history()
    }

    // ── Resume progress ─────────────────────────────────────────

    /// Store the playback offset for `locator`, stamped with the current time.
    /// Always overwrites what was there.
    pub fn save_resume_progress(
        &mut self,
        locator: &MediaLocator,
        timestamp_seconds: f64,
        duration_seconds: f64,
    ) -> Result<ResumeWrite, PersistenceError> {
        let now = (self.clock)();
        self.write_resume(locator, timestamp_seconds, duration_seconds, now, false)
    }

    /// Like [`save_resume_progress`](Self::save_resume_progress) but with a
    /// caller-supplied observation time. A write observed before the stored
    /// entry's `last_watched_at` is ignored and reported as `Stale`.
    pub fn save_resume_progress_at(
        &mut self,
        locator: &MediaLocator,
        timestamp_seconds: f64,
        duration_seconds: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<ResumeWrite, PersistenceError> {
        self.write_resume(locator, timestamp_seconds, duration_seconds, observed_at, true)
    }

    pub fn get_resume_progress(&self, locator: &MediaLocator) -> Option<ResumePoint> {
        self.resume_progress.get(&locator.key()).map(ResumeProgress::point)
    }

    /// Drop the stored offset for `locator`. Returns whether one existed.
    pub fn clear_resume_progress(&mut self, locator: &MediaLocator) -> Result<bool, PersistenceError> {
        if self.resume_progress.remove(&locator.key()).is_none() {
            return Ok(false);
        }
        self.flush_resume_progress()?;
        Ok(true)
    }

    fn write_resume(
        &mut self,
        locator: &MediaLocator,
        timestamp_seconds: f64,
        duration_seconds: f64,
        observed_at: DateTime<Utc>,
        monotonic: bool,
    ) -> Result<ResumeWrite, PersistenceError> {
        let key = locator.key();

        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(timestamp_seconds) || !valid(duration_seconds) {
            warn!(
                operation = "resume_save",
                key = %key,
                timestamp_seconds,
                duration_seconds,
                "Ignoring resume progress with invalid offset"
            );
            return Ok(ResumeWrite::Invalid);
        }

        if monotonic {
            if let Some(existing) = self.resume_progress.get(&key) {
                if observed_at < existing.last_watched_at {
                    debug!(
                        operation = "resume_save",
                        key = %key,
                        stored = %existing.last_watched_at,
                        observed = %observed_at,
                        "Ignoring stale resume progress"
                    );
                    return Ok(ResumeWrite::Stale);
                }
            }
        }

        self.resume_progress.insert(
            key,
            ResumeProgress {
                timestamp_seconds,
                duration_seconds,
                last_watched_at: observed_at,
            },
        );
        self.flush_resume_progress()?;
        Ok(ResumeWrite::Saved)
    }

    // ── Whole-store operations ──────────────────────────────────

    /// Copy of all three collections in their persisted shape
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            watch_later: self.watch_later.clone(),
            watch_history: self.watch_history.clone(),
            resume_progress: self.resume_progress.clone(),
        }
    }

    /// Replace every collection with the snapshot's contents and persist them.
    ///
    /// The snapshot goes through the same normalization as a rehydrate, so
    /// duplicates are dropped and history is cut to the configured limit.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<(), PersistenceError> {
        self.replace_collections(snapshot.watch_later, snapshot.watch_history, snapshot.resume_progress);
        info!(
            operation = "store_import",
            watch_later = self.watch_later.len(),
            watch_history = self.watch_history.len(),
            resume_progress = self.resume_progress.len(),
            "Imported personalization snapshot"
        );
        self.flush_watch_later()?;
        self.flush_watch_history()?;
        self.flush_resume_progress()
    }

    /// Empty every collection and delete the persisted values.
    ///
    /// Every key is attempted; the first failure the write policy lets through
    /// is returned.
    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        self.watch_later.clear();
        self.watch_history.clear();
        self.resume_progress.clear();

        let mut first_error = None;
        for key in [WATCH_LATER_KEY, WATCH_HISTORY_KEY, RESUME_PROGRESS_KEY] {
            if let Err(e) = self.with_policy(key, |storage| storage.remove(key)) {
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(operation = "store_clear", "Cleared personalization store");
        Ok(())
    }

    fn replace_collections(
        &mut self,
        watch_later: Vec<WatchLaterEntry>,
        watch_history: Vec<WatchHistoryEntry>,
        resume_progress: BTreeMap<String, ResumeProgress>,
    ) {
        self.watch_later = if self.config.enforce_unique_watch_later {
            dedup_watch_later(watch_later)
        } else {
            watch_later
        };
        self.watch_history = normalize_history(watch_history, self.config.history_limit);
        self.resume_progress = canonicalize_resume_keys(resume_progress);
    }

    // ── Persistence ─────────────────────────────────────────────

    fn flush_watch_later(&mut self) -> Result<(), PersistenceError> {
        let json = encode(WATCH_LATER_KEY, &self.watch_later)?;
        self.write_with_policy(WATCH_LATER_KEY, &json)
    }

    fn flush_watch_history(&mut self) -> Result<(), PersistenceError> {
        let json = encode(WATCH_HISTORY_KEY, &self.watch_history)?;
        self.write_with_policy(WATCH_HISTORY_KEY, &json)
    }

    fn flush_resume_progress(&mut self) -> Result<(), PersistenceError> {
        let json = encode(RESUME_PROGRESS_KEY, &self.resume_progress)?;
        self.write_with_policy(RESUME_PROGRESS_KEY, &json)
    }

    fn write_with_policy(&mut self, key: &str, json: &str) -> Result<(), PersistenceError> {
        self.with_policy(key, |storage| storage.write(key, json))
    }

    /// Run a storage mutation under the configured failure policy
    fn with_policy<F>(&mut self, key: &str, mut op: F) -> Result<(), PersistenceError>
    where
        F: FnMut(&mut S) -> Result<(), PersistenceError>,
    {
        let err = match op(&mut self.storage) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match self.config.write_failure_policy {
            WriteFailurePolicy::Propagate => Err(err),
            WriteFailurePolicy::RetryOnce => {
                warn!(operation = "store_write", key, error = %err, "Write failed, retrying once");
                op(&mut self.storage)
            }
            WriteFailurePolicy::LogAndDrop => {
                warn!(
                    operation = "store_write",
                    key,
                    error = %err,
                    "Write failed, change kept in memory only"
                );
                Ok(())
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|source| PersistenceError::Serialize {
        key: key.to_string(),
        source,
    })
}

/// Raw JSON stored under `key`, or `None` when absent, unreadable or malformed
fn read_json<S: KeyValueStorage>(storage: &S, key: &str) -> Option<Value> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored value for {}, starting empty", key);
            return None;
        }
        Err(e) => {
            warn!("Failed to read {} from storage: {}. Starting empty.", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Stored value for {} is malformed: {}. Starting empty.", key, e);
            None
        }
    }
}

/// Load a JSON array, keeping every element that parses
fn load_list<S, T>(storage: &S, key: &str) -> Vec<T>
where
    S: KeyValueStorage,
    T: DeserializeOwned,
{
    let items = match read_json(storage, key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("Stored value for {} is not a list. Starting empty.", key);
            return Vec::new();
        }
        None => return Vec::new(),
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(operation = "store_open", key, index, error = %e, "Dropping unreadable entry");
                None
            }
        })
        .collect()
}

/// Load a JSON object, keeping every value that parses
fn load_map<S, T>(storage: &S, key: &str) -> BTreeMap<String, T>
where
    S: KeyValueStorage,
    T: DeserializeOwned,
{
    let entries = match read_json(storage, key) {
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            warn!("Stored value for {} is not an object. Starting empty.", key);
            return BTreeMap::new();
        }
        None => return BTreeMap::new(),
    };

    entries
        .into_iter()
        .filter_map(|(entry_key, value)| match T::deserialize(value) {
            Ok(entry) => Some((entry_key, entry)),
            Err(e) => {
                warn!(operation = "store_open", key, entry = %entry_key, error = %e, "Dropping unreadable entry");
                None
            }
        })
        .collect()
}

/// Keep the first bookmark for each (id, media type) pair
fn dedup_watch_later(entries: Vec<WatchLaterEntry>) -> Vec<WatchLaterEntry> {
    let mut kept: Vec<WatchLaterEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !kept.iter().any(|k| k.matches(entry.id, Some(entry.media_type))) {
            kept.push(entry);
        }
    }
    kept
}

/// History is most-recent-first: keep the first occurrence of each pair, then cap
fn normalize_history(entries: Vec<WatchHistoryEntry>, limit: usize) -> Vec<WatchHistoryEntry> {
    let mut kept: Vec<WatchHistoryEntry> = Vec::with_capacity(entries.len().min(limit));
    for entry in entries {
        if !kept.iter().any(|k| k.same_media(&entry)) {
            kept.push(entry);
        }
    }
    kept.truncate(limit);
    kept
}

/// Rewrite parseable keys into their canonical locator form. When two old keys
/// land on the same locator, the more recently watched entry wins. Keys that do
/// not parse are kept verbatim.
fn canonicalize_resume_keys(progress: BTreeMap<String, ResumeProgress>) -> BTreeMap<String, ResumeProgress> {
    let mut canonical: BTreeMap<String, ResumeProgress> = BTreeMap::new();
    for (key, value) in progress {
        let key = match key.parse::<MediaLocator>() {
            Ok(locator) => locator.key(),
            Err(_) => key,
        };
        match canonical.get(&key) {
            Some(existing) if existing.last_watched_at >= value.last_watched_at => {}
            _ => {
                canonical.insert(key, value);
            }
        }
    }
    canonical
}
