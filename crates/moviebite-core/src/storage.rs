use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};
use crate::error::PersistenceError;

/// Durable string-keyed storage the personalization store writes through to.
///
/// Reads of an absent key return `Ok(None)`. Writes replace the whole value.
pub trait KeyValueStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// One JSON file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!("Storage miss: {} (file does not exist)", key);
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| PersistenceError::io(key, e))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(key, e))?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&temp_path, value) {
            warn!("Failed to write storage file for {}: {}", key, e);
            return Err(PersistenceError::io(key, e));
        }
        std::fs::rename(&temp_path, &path).map_err(|e| PersistenceError::io(key, e))?;

        debug!("Storage saved: {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| PersistenceError::io(key, e))?;
        }
        Ok(())
    }
}

/// Process-local storage. Can be told to fail upcoming writes.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    failing_writes: usize,
    write_count: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the write counter
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Make the next `count` writes or removals fail with [`PersistenceError::Unavailable`]
    pub fn set_failing_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(PersistenceError::Unavailable(format!("write to '{}' refused", key)));
        }
        self.values.insert(key.to_string(), value.to_string());
        self.write_count += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(PersistenceError::Unavailable(format!("removal of '{}' refused", key)));
        }
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("store"));

        assert_eq!(storage.read("watchLater").unwrap(), None);

        storage.write("watchLater", "[]").unwrap();
        assert_eq!(storage.read("watchLater").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("store/watchLater.json").exists());
        assert!(!dir.path().join("store/watchLater.json.tmp").exists());

        storage.remove("watchLater").unwrap();
        assert_eq!(storage.read("watchLater").unwrap(), None);
        // Removing again is fine
        storage.remove("watchLater").unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.write("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(storage.read("").is_err());
    }

    #[test]
    fn test_memory_storage_failing_writes() {
        let mut storage = MemoryStorage::new();
        storage.set_failing_writes(1);
        assert!(storage.write("k", "v1").is_err());
        storage.write("k", "v2").unwrap();
        assert_eq!(storage.raw("k"), Some("v2"));
        assert_eq!(storage.write_count(), 1);

        storage.set_failing_writes(1);
        assert!(storage.remove("k").is_err());
        assert_eq!(storage.raw("k"), Some("v2"));
    }
}
