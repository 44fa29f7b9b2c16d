//! Tracing subscriber setup for binaries and demos
//!
//! `RUST_LOG` wins when set; otherwise `default_level` applies to every target.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` or `default_level`
///
/// Fails if a global subscriber is already installed or the level does not
/// parse as a filter directive.
pub fn init_logging(default_level: &str) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(default_level)?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn level_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}
