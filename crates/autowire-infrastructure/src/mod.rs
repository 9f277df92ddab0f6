//! # Autowire Infrastructure
//!
//! The runtime side: booting a compiled container and everything around it.
//!
//! ## Module Categories
//!
//! ### Runtime
//! | Module | Description |
//! |--------|-------------|
//! | [`container`] | The running container: lazy shared instances, scopes, runtime services |
//! | [`bootstrap`] | Configurator from files and extensions to a running container |
//!
//! ### Storage
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Fingerprinted artifact cache for compiled containers |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | figment-based TOML and environment configuration |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | Centralized configuration constants |
//! | [`error_ext`] | Context for foreign errors |

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod constants;
pub mod container;
pub mod error_ext;
pub mod logging;

pub use bootstrap::Bootstrap;
pub use cache::{ArtifactCache, Fingerprint};
pub use config::{ConfigLoader, ContainerConfig, LoggingConfig};
pub use container::{Container, ServiceFactory, ServiceSource};
pub use error_ext::ErrorContext;
