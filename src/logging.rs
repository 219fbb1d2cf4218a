//! Structured logging setup built on `tracing`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{field, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level or filter directive (error, warn, info, debug, trace)
    pub level: String,

    /// Log format (json, human)
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Human,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
        }
    }
}

impl LogConfig {
    /// Override the level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Filter from `RUST_LOG`, falling back to the configured level
    pub fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| Error::configuration("logging.level", e.to_string()))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which leaves the
/// existing one in place.
pub fn init_logging(config: &LogConfig) -> Result<bool> {
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries sensor output, so logs go to stderr
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .is_ok(),
        LogFormat::Human => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "Logging system initialized"
        );
    }

    Ok(installed)
}

/// Span wrapping one operation on a named component
pub fn component_span(component: &str, operation: &str) -> Span {
    tracing::debug_span!(
        "component_operation",
        component = component,
        operation = operation,
        anomaly = field::Empty,
    )
}
