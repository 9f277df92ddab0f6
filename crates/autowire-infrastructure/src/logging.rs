//! Structured logging with tracing
//!
//! The container itself only emits `tracing` events. Applications that do
//! not install their own subscriber can call [`init_logging`] once at
//! startup.

use std::path::Path;

use autowire_domain::error::{Error, Result};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::config::LoggingConfig;
use crate::constants::LOG_ENV_FILTER;

/// Install the global subscriber
///
/// `AUTOWIRE_LOG` overrides the configured level with a full filter
/// directive. Fails when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter = EnvFilter::try_from_env(LOG_ENV_FILTER).unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };
    installed.map_err(|e| Error::invalid_state(format!("Logging already initialized: {e}")))?;

    info!("Logging initialized with level: {}", level);
    Ok(())
}

/// Parse a log level name
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::configuration(format!(
            "Invalid log level: {level}. Use trace, debug, info, warn, or error"
        ))),
    }
}

/// Log configuration loading status
pub fn log_config_loaded(config_path: &Path, success: bool) {
    if success {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        warn!("Configuration file not found: {}", config_path.display());
    }
}
