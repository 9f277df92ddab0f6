//! Interface definitions - deferred bindings of an interface to a result

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::ServiceDefinition;

/// "Consumers of `interface` receive the service built by `result`"
///
/// The concrete type of the result is only known once the result factory is
/// resolved at compile time; it must be a single instantiable type that
/// implements the interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    name: String,
    interface: Option<String>,
    result: ServiceDefinition,
    tags: BTreeMap<String, Value>,
    autowired: bool,
}

impl InterfaceDefinition {
    /// A new, autowired interface definition
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            result: ServiceDefinition::new(name.clone()),
            name,
            interface: None,
            tags: BTreeMap::new(),
            autowired: true,
        }
    }

    /// Definition name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound interface
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Bind the interface
    pub fn set_interface(&mut self, interface: impl Into<String>) -> &mut Self {
        self.interface = Some(interface.into());
        self
    }

    /// The definition producing the concrete object
    pub fn result(&self) -> &ServiceDefinition {
        &self.result
    }

    /// Configure the definition producing the concrete object
    pub fn result_mut(&mut self) -> &mut ServiceDefinition {
        &mut self.result
    }

    /// Attach a tag
    pub fn add_tag(&mut self, name: impl Into<String>, attributes: impl Into<Value>) -> &mut Self {
        self.tags.insert(name.into(), attributes.into());
        self
    }

    /// Tags of the binding
    pub fn tags(&self) -> &BTreeMap<String, Value> {
        &self.tags
    }

    /// Include or exclude the binding from by-type resolution
    pub fn set_autowired(&mut self, autowired: bool) -> &mut Self {
        self.autowired = autowired;
        self
    }

    /// Whether the binding takes part in by-type resolution
    pub fn is_autowired(&self) -> bool {
        self.autowired
    }

    /// Turn the binding into a plain service definition whose factory is the
    /// result's factory and whose declared type is the concrete result type
    pub fn into_service(self, concrete_type: &str) -> ServiceDefinition {
        let mut service = self.result;
        service.rename(self.name);
        service.set_type(concrete_type).set_autowired(self.autowired);
        for (tag, attributes) in self.tags {
            service.add_tag(tag, attributes);
        }
        service
    }
}
