use thiserror::Error;

/// Failure reported by a [`KeyValueStorage`](crate::KeyValueStorage) backend
/// or while encoding a collection for it.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("failed to encode '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        PersistenceError::Io {
            key: key.to_string(),
            source,
        }
    }
}
