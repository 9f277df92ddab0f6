//! Entities of the service registry

pub mod definition;
pub mod interface;

pub use definition::{
    Argument, Arguments, Entity, Reference, ServiceDefinition, SetupCall, Statement,
};
pub use interface::InterfaceDefinition;
