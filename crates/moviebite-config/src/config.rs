use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::paths::PathManager;

/// Watch history keeps this many entries unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub resume: ResumeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub write_failure_policy: WriteFailurePolicy,

    /// Reject a second watch-later entry for the same (id, media type)
    #[serde(default = "default_true")]
    pub enforce_unique_watch_later: bool,
}

/// What a mutation does when the backing storage refuses a write.
///
/// The in-memory collections keep the mutation under every policy; only the
/// value returned to the caller differs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WriteFailurePolicy {
    /// Return the persistence error to the caller
    #[default]
    Propagate,
    /// Try the write a second time, then propagate
    RetryOnce,
    /// Log a warning and report success
    LogAndDrop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeConfig {
    /// Progress below this offset is not offered as "continue watching"
    #[serde(default = "default_min_visible_seconds")]
    pub min_visible_seconds: f64,

    /// Players forward progress to the store at most this often
    #[serde(default = "default_save_interval_seconds")]
    pub save_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also log to this file, rotated daily. Empty means `logs/moviebite.log`;
    /// relative paths are taken from the log directory.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_min_visible_seconds() -> f64 {
    30.0
}

fn default_save_interval_seconds() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            write_failure_policy: WriteFailurePolicy::default(),
            enforce_unique_watch_later: default_true(),
        }
    }
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            min_visible_seconds: default_min_visible_seconds(),
            save_interval_seconds: default_save_interval_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Absolute path of the log file, if file logging is enabled
    pub fn resolve_file(&self, paths: &PathManager) -> Option<PathBuf> {
        let file = self.file.as_ref()?;
        if file.as_os_str().is_empty() {
            Some(paths.default_log_file())
        } else if file.is_relative() {
            Some(paths.log_dir().join(file))
        } else {
            Some(file.clone())
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or fall back to defaults when it does not exist yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.history_limit == 0 {
            return Err(anyhow::anyhow!("store.history_limit must be at least 1"));
        }

        if self.resume.save_interval_seconds == 0 {
            return Err(anyhow::anyhow!("resume.save_interval_seconds must be at least 1"));
        }

        if !self.resume.min_visible_seconds.is_finite() || self.resume.min_visible_seconds < 0.0 {
            return Err(anyhow::anyhow!("resume.min_visible_seconds must be a non-negative number"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!("Invalid logging.level: {}", self.logging.level));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            store: StoreConfig {
                history_limit: 20,
                write_failure_policy: WriteFailurePolicy::RetryOnce,
                enforce_unique_watch_later: false,
            },
            resume: ResumeConfig {
                min_visible_seconds: 45.0,
                save_interval_seconds: 10,
            },
            logging: LoggingConfig::default(),
        };

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.store.write_failure_policy, WriteFailurePolicy::RetryOnce);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[store]\nwrite_failure_policy = \"log-and-drop\"\n").unwrap();
        assert_eq!(config.store.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.store.write_failure_policy, WriteFailurePolicy::LogAndDrop);
        assert!(config.store.enforce_unique_watch_later);
        assert_eq!(config.resume.save_interval_seconds, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.store.history_limit = 0;
        assert!(config.validate().is_err());
        config.store.history_limit = 50;

        config.resume.save_interval_seconds = 0;
        assert!(config.validate().is_err());
        config.resume.save_interval_seconds = 30;

        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_file_resolution() {
        let paths = PathManager::from_base(PathBuf::from("/srv/mb"));
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.resolve_file(&paths), None);

        let config: Config = toml::from_str("[logging]\nfile = \"\"\n").unwrap();
        assert_eq!(config.logging.resolve_file(&paths), Some(paths.default_log_file()));

        logging.file = Some(PathBuf::from("player.log"));
        assert_eq!(logging.resolve_file(&paths), Some(PathBuf::from("/srv/mb/logs/player.log")));

        logging.file = Some(PathBuf::from("/var/log/moviebite.log"));
        assert_eq!(logging.resolve_file(&paths), Some(PathBuf::from("/var/log/moviebite.log")));
    }
}
