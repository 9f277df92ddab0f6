//! # Autowire Application
//!
//! The compile phase: everything between "definitions are declared" and
//! "the container is generated".
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`builder`] | Mutable registry of definitions, aliases and parameters |
//! | [`autowiring`] | Parameter-list filling shared with the runtime |
//! | [`resolver`] | Type inference and definition completion |
//! | [`registry`] | Frozen, fully resolved registry |
//! | [`schema`] | Extension configuration schemas |
//! | [`extension`] | The extension trait and its phase contexts |
//! | [`extensions`] | Built-in extensions |
//! | [`compiler`] | The phase pipeline |
//! | [`generator`] | Generated container plan and its Rust rendering |

pub mod autowiring;
pub mod builder;
pub mod compiler;
pub mod extension;
pub mod extensions;
pub mod generator;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use autowiring::{Resolved, TypeLookup, autowire_arguments};
pub use builder::ContainerBuilder;
pub use compiler::Compiler;
pub use extension::{ClassSkeleton, CompilerContext, Extension};
pub use extensions::{DiExtension, SearchExtension, ServicesExtension};
pub use generator::{CodeGenerator, Expr, GeneratedContainer, ServiceMethod};
pub use registry::CompiledRegistry;
pub use resolver::Resolver;
pub use schema::{Field, Schema};
