//! Layered configuration for countdown delays and logging.
//!
//! Loading flow:
//! 1. Start with [`ReaperConfig::default()`]
//! 2. If a JSON file is given and exists, its fields replace the defaults
//!    (absent fields keep their default)
//! 3. Apply environment variable overrides (highest priority)
//!
//! Environment values that do not parse are ignored with a warning.

use crate::lifecycle::domain::{CauseText, DEFAULT_AUTOMATIC_CAUSE};
use crate::lifecycle::services::LifecycleSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Overrides the short countdown, in seconds.
pub const ENV_KILL_DURATION: &str = "REAPER_KILL_DURATION";
/// Overrides the long countdown, in seconds.
pub const ENV_KILL_DURATION_WITH_DESCRIPTION: &str = "REAPER_KILL_DURATION_WITH_DESCRIPTION";
/// Overrides the cause recorded by unattended deaths.
pub const ENV_AUTOMATIC_CAUSE: &str = "REAPER_AUTOMATIC_CAUSE";
/// Overrides the log filter directive.
pub const ENV_LOG_FILTER: &str = "REAPER_LOG_FILTER";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ReaperConfig`].
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON failure.
        source: serde_json::Error,
    },

    /// The automatic cause is blank.
    #[error("automatic cause must not be empty")]
    EmptyAutomaticCause,

    /// The long countdown is shorter than the short one.
    #[error(
        "kill_duration_with_description ({long}s) must not be shorter than kill_duration ({short}s)"
    )]
    DelayOrder {
        /// Configured short countdown in seconds.
        short: u64,
        /// Configured long countdown in seconds.
        long: u64,
    },
}

/// Effective configuration of the reaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaperConfig {
    /// Seconds before an unattended or fully described entity dies.
    pub kill_duration: u64,
    /// Seconds before an entity with a cause dies.
    pub kill_duration_with_description: u64,
    /// Cause recorded by unattended deaths.
    pub automatic_cause: String,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            kill_duration: 40,
            kill_duration_with_description: 400,
            automatic_cause: DEFAULT_AUTOMATIC_CAUSE.to_owned(),
            log_filter: "info".to_owned(),
        }
    }
}

impl ReaperConfig {
    /// Loads configuration from `path` with process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or the
    /// result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Loads configuration from `path`, reading overrides through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or the
    /// result fails validation.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(file) => Self::from_file(file)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read or
    /// [`ConfigError::Parse`] when it is not valid configuration JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(?path, "configuration file not found, using defaults");
            return Ok(Self::default());
        }
        debug!(?path, "loading configuration from file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seconds) = read_seconds(&lookup, ENV_KILL_DURATION) {
            self.kill_duration = seconds;
        }
        if let Some(seconds) = read_seconds(&lookup, ENV_KILL_DURATION_WITH_DESCRIPTION) {
            self.kill_duration_with_description = seconds;
        }
        if let Some(cause) = read_string(&lookup, ENV_AUTOMATIC_CAUSE) {
            self.automatic_cause = cause;
        }
        if let Some(filter) = read_string(&lookup, ENV_LOG_FILTER) {
            self.log_filter = filter;
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAutomaticCause`] or
    /// [`ConfigError::DelayOrder`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.automatic_cause.trim().is_empty() {
            return Err(ConfigError::EmptyAutomaticCause);
        }
        if self.kill_duration_with_description < self.kill_duration {
            return Err(ConfigError::DelayOrder {
                short: self.kill_duration,
                long: self.kill_duration_with_description,
            });
        }
        Ok(())
    }

    /// Returns the short countdown.
    #[must_use]
    pub const fn short_delay(&self) -> Duration {
        Duration::from_secs(self.kill_duration)
    }

    /// Returns the long countdown.
    #[must_use]
    pub const fn long_delay(&self) -> Duration {
        Duration::from_secs(self.kill_duration_with_description)
    }

    /// Builds the lifecycle settings described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAutomaticCause`] when the cause is blank.
    pub fn lifecycle_settings(&self) -> Result<LifecycleSettings, ConfigError> {
        let cause = CauseText::new(self.automatic_cause.as_str())
            .map_err(|_| ConfigError::EmptyAutomaticCause)?;
        Ok(
            LifecycleSettings::new(self.short_delay(), self.long_delay())
                .with_automatic_cause(cause),
        )
    }
}

/// Parses a whole number of seconds.
fn parse_seconds(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

fn read_seconds(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    let value = lookup(name)?;
    let parsed = parse_seconds(&value);
    if parsed.is_none() {
        warn!(key = name, value = %value, "invalid seconds in environment, ignoring");
    }
    parsed
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}
