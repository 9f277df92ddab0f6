//! Configuration types

use std::path::PathBuf;

use autowire_domain::constants::DEFAULT_CONTAINER_CLASS;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_LOG_LEVEL;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
        }
    }
}

/// Settings of the container itself, read from the `container` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name of the generated container
    pub class_name: String,

    /// Where compiled artifacts are kept; `None` compiles in memory on every boot
    pub cache_dir: Option<PathBuf>,

    /// Debug mode: cached artifacts are rewritten on every boot and the `di`
    /// extension publishes the flag as the `debug` parameter
    pub debug: bool,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CONTAINER_CLASS.to_string(),
            cache_dir: None,
            debug: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Everything read by the loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    /// Container settings
    pub container: ContainerConfig,

    /// Remaining sections, keyed by extension name (plus `parameters`)
    pub sections: Map<String, Value>,
}

impl LoadedConfig {
    /// The sections as one JSON map, ready for the compiler
    pub fn sections_value(&self) -> Value {
        Value::Object(self.sections.clone())
    }
}
