//! Configuration loading
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`loader`] | figment-based loader for TOML files and environment variables |
//! | [`types`] | Container settings and the loaded configuration |

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{ContainerConfig, LoadedConfig, LoggingConfig};
