//! Core configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - `CoreConfig::validate` passes before any component is built from it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Converted dates sit at most two days from native dates (UTC-12 vs UTC+14
/// plus time of day); less slack drops boundary items.
pub const MIN_FETCH_SLACK_DAYS: u32 = 2;
/// Largest slack we accept; anything above this only costs fetch volume.
const MAX_FETCH_SLACK_DAYS: u32 = 7;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "cannot read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config json: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Aggregation tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Days added on each side of the requested range when fetching in an
    /// item's native frame. Two days covers the widest zone offset spread.
    pub fetch_slack_days: u32,
    /// Maximum concurrent source fetches; `1` fetches sequentially.
    pub fetch_parallelism: usize,
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let slack = self.fetch_slack_days;
        if !(MIN_FETCH_SLACK_DAYS..=MAX_FETCH_SLACK_DAYS).contains(&slack) {
            return Err(ConfigError::Invalid(format!(
                "aggregation.fetch_slack_days must be within {MIN_FETCH_SLACK_DAYS}..={MAX_FETCH_SLACK_DAYS}, got {slack}"
            )));
        }
        if self.fetch_parallelism == 0 {
            return Err(ConfigError::Invalid(
                "aggregation.fetch_parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            fetch_slack_days: 2,
            fetch_parallelism: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; stderr when absent.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

impl CoreConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregation.validate()?;
        if let Some(dir) = &self.logging.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Reads and validates a JSON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<CoreConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    CoreConfig::from_json(&text)
}
