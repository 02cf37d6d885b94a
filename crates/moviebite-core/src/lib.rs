pub mod error;
pub mod insights;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use error::PersistenceError;
pub use insights::{continue_watching, format_resume_time, top_genres, ResumePrompt, SaveThrottle};
pub use snapshot::Snapshot;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{PersonalizationStore, ResumeWrite, RESUME_PROGRESS_KEY, WATCH_HISTORY_KEY, WATCH_LATER_KEY};
