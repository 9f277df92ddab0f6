//! # Autowire Domain
//!
//! Core types shared by the compile phase and the runtime container.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Declared class metadata, signatures and type-erased instances |
//! | [`entities`] | Service definitions, statements, references |
//! | [`value_objects`] | Parameters, wiring graph, natural ordering, suggestions |
//! | [`ports`] | Interfaces implemented by outer layers |
//! | [`error`] | The container error taxonomy |
//! | [`constants`] | Reference syntax and naming constants |

pub mod catalog;
pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use catalog::{
    ArgValue, Args, Callable, ClassInfo, ClassKind, Instance, Parameter, TypeCatalog, TypeHint,
};
pub use entities::{
    Argument, Arguments, Entity, InterfaceDefinition, Reference, ServiceDefinition, SetupCall,
    Statement,
};
pub use error::{Error, Result};
pub use ports::ServiceLocator;
pub use value_objects::{Parameters, WiringTable};
