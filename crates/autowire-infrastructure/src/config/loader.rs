//! Configuration loader
//!
//! Sources are merged in this order, later sources override earlier ones:
//!
//! 1. `ContainerConfig::default()` under the `container` section
//! 2. Each TOML file, in the order they were added
//! 3. Environment variables with the prefix, nested keys separated by `__`
//!    (`AUTOWIRE_PARAMETERS__DB__HOST` sets `parameters.db.host`)
//!
//! The `container` section configures the container itself; every other
//! top-level table is handed to the compiler as an extension section.

use std::path::{Path, PathBuf};

use autowire_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde_json::Value;

use crate::config::{ContainerConfig, LoadedConfig};
use crate::constants::{CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, CONTAINER_SECTION};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};

// `AUTOWIRE_LOG` is the log filter, not a section
const LOG_ENV_KEY: &str = "log";

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration files, in merge order
    files: Vec<PathBuf>,

    /// Environment prefix, `None` disables environment variables
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader reading `AUTOWIRE_*` environment variables
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            env_prefix: Some(CONFIG_ENV_PREFIX.to_string()),
        }
    }

    /// Add a configuration file
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    #[must_use]
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Ignore environment variables
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Configuration files, in merge order
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.files
    }

    /// Load configuration from all sources
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut figment =
            Figment::new().merge(Serialized::default(CONTAINER_SECTION, ContainerConfig::default()));

        for path in &self.files {
            if !path.exists() {
                log_config_loaded(path, false);
                return Err(Error::configuration(format!(
                    "Configuration file '{}' not found.",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
            log_config_loaded(path, true);
        }

        if let Some(prefix) = &self.env_prefix {
            figment = figment.merge(
                Env::prefixed(&format!("{prefix}_"))
                    .ignore(&[LOG_ENV_KEY])
                    .split(CONFIG_ENV_SEPARATOR),
            );
        }

        let container: ContainerConfig = figment
            .extract_inner(CONTAINER_SECTION)
            .config_context("Failed to extract container settings")?;
        validate_container_config(&container)?;

        let mut sections = match figment
            .extract::<Value>()
            .config_context("Failed to extract configuration")?
        {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        sections.remove(CONTAINER_SECTION);

        Ok(LoadedConfig { container, sections })
    }
}

fn validate_container_config(config: &ContainerConfig) -> Result<()> {
    if config.class_name.is_empty()
        || !config.class_name.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(Error::configuration(format!(
            "Container class name '{}' must be a non-empty identifier",
            config.class_name
        )));
    }
    parse_log_level(&config.logging.level)?;
    Ok(())
}
