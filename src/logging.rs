//! Tracing subscriber setup for binaries and tests embedding remacro.
//!
//! The library only emits events; nothing is printed unless the embedding
//! program installs a subscriber. `RUST_LOG` overrides the given level.

use std::io;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::RewriteError;

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Formatting of log lines on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Install the global subscriber.
///
/// # Panics
/// Panics if a global subscriber is already installed; use
/// [`try_init_tracing`] when that can happen.
pub fn init_tracing(level: LogLevel, format: LogFormat) {
    if let Err(err) = try_init_tracing(level, format) {
        panic!("{err}");
    }
}

/// Install the global subscriber, failing if one is already installed.
pub fn try_init_tracing(level: LogLevel, format: LogFormat) -> Result<(), RewriteError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let result = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
    };
    result.map_err(|e| RewriteError::Config {
        message: format!("cannot install tracing subscriber: {e}"),
    })
}
