pub mod config;
pub mod paths;

pub use config::{Config, LoggingConfig, ResumeConfig, StoreConfig, WriteFailurePolicy, DEFAULT_HISTORY_LIMIT};
pub use paths::{PathManager, container_base_path};
