//! `tracing` subscriber setup for the command-line driver.
//!
//! Diagnostics go to stderr so stdout stays a clean JSON channel.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter {directive:?}: {source}")]
    InvalidFilter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser failure.
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Builds the filter for the subscriber.
///
/// A parsable `RUST_LOG` value wins over the configured directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `RUST_LOG` is unusable and
/// `configured` does not parse.
pub fn build_filter(rust_log: Option<&str>, configured: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|directive| EnvFilter::try_new(directive).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(configured).map_err(|source| TelemetryError::InvalidFilter {
        directive: configured.to_owned(),
        source,
    })
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` or
/// `configured`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a global
/// subscriber is already set.
pub fn init_tracing(configured: &str) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), configured)?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
