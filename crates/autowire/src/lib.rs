//! # Autowire
//!
//! A compiled, autowiring dependency injection container.
//!
//! Services are declared programmatically or in configuration sections
//! owned by extensions. The compiler resolves every definition against an
//! explicit [`TypeCatalog`], fills constructor parameters by type, freezes
//! the registry and generates a container plan. The runtime [`Container`]
//! creates services lazily from that plan and shares them.
//!
//! ## Example
//!
//! ```ignore
//! use autowire::prelude::*;
//! use serde_json::json;
//!
//! let catalog = TypeCatalog::new()
//!     .with(ClassInfo::class("Logger").constructor(vec![], |_| Ok(Logger)))
//!     .with(ClassInfo::class("App").constructor(
//!         vec![Parameter::service("logger", "Logger")],
//!         |args| Ok(App { logger: args.service::<Logger>("logger")? }),
//!     ));
//!
//! let container = Bootstrap::new(catalog)
//!     .with_default_extensions()?
//!     .add_config(json!({ "services": { "logger": "Logger", "app": "App" } }))?
//!     .create_container()?;
//!
//! let app = container.get_by_type_as::<App>("App")?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Definitions, the type catalog, parameters and errors
//! - `application` - Builder, resolver, compiler passes and code generation
//! - `infrastructure` - Runtime container, configuration, artifact cache, logging

/// Domain layer - definitions, catalog and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use autowire_domain::*;
}

/// Application layer - the compile phase
///
/// Re-exports from the application crate for convenience
pub mod application {
    pub use autowire_application::*;
}

/// Infrastructure layer - the runtime container and its surroundings
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use autowire_infrastructure::*;
}

// Generated containers refer to `autowire::generator` and `autowire::serde_json`
pub use autowire_application::generator;
pub use serde_json;

// Re-export commonly used types at the crate root
pub use domain::*;

pub use application::{
    ClassSkeleton, CodeGenerator, CompiledRegistry, Compiler, CompilerContext, ContainerBuilder,
    DiExtension, Extension, GeneratedContainer, SearchExtension, ServicesExtension,
};
pub use infrastructure::{Bootstrap, ConfigLoader, Container, ServiceFactory, ServiceSource};

/// Everything needed to declare a catalog and boot a container
pub mod prelude {
    pub use crate::{
        ArgValue, Args, Bootstrap, ClassInfo, Compiler, Container, ContainerBuilder, Error,
        Instance, Parameter, Result, ServiceLocator, ServiceSource, TypeCatalog,
    };
}
