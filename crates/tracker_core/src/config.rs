//! Runtime configuration for opening a tracker store.
//!
//! # Invariants
//! - Defaults never fail; only explicit overrides can be rejected.

use crate::calc::calendar::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::logging::LogLevel;
use crate::store::DEFAULT_NAMESPACE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DATA_DIR: &str = "TRACKER_DATA_DIR";
pub const ENV_DB_FILE: &str = "TRACKER_DB_FILE";
pub const ENV_NAMESPACE: &str = "TRACKER_NAMESPACE";
pub const ENV_LOG_LEVEL: &str = "TRACKER_LOG_LEVEL";
pub const ENV_HABIT_WINDOW_DAYS: &str = "TRACKER_HABIT_WINDOW_DAYS";

const DEFAULT_DB_FILE_NAME: &str = "tracker.sqlite3";
const APP_DIR_NAME: &str = "tracker";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where and how the tracker keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub namespace: String,
    pub log_level: LogLevel,
    pub habit_window_days: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self {
            data_dir,
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            log_level: LogLevel::default_for_build(),
            habit_window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `TRACKER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = value(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(file) = value(ENV_DB_FILE) {
            let file = file.trim();
            if file.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue {
                    key: ENV_DB_FILE,
                    value: file.to_string(),
                    reason: "must be a bare file name",
                });
            }
            config.db_file_name = file.to_string();
        }
        if let Some(namespace) = value(ENV_NAMESPACE) {
            let namespace = namespace.trim();
            if namespace.contains(|ch: char| ch.is_whitespace() || ch == '-') {
                return Err(ConfigError::InvalidValue {
                    key: ENV_NAMESPACE,
                    value: namespace.to_string(),
                    reason: "must not contain whitespace or `-`",
                });
            }
            config.namespace = namespace.to_string();
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: level.clone(),
                reason: "expected trace|debug|info|warn|error",
            })?;
        }
        if let Some(days) = value(ENV_HABIT_WINDOW_DAYS) {
            config.habit_window_days = days
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_HABIT_WINDOW_DAYS,
                    value: days.clone(),
                    reason: "expected a whole number of days from 1 to 366",
                })?;
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}
