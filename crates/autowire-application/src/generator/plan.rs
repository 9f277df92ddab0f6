//! The generated container: one factory method per service
//!
//! Method bodies are expression trees over catalog entities. They are
//! serialisable, so the plan can be cached as a JSON artifact and loaded
//! without recompiling, and renderable as Rust source.

use std::collections::BTreeMap;

use autowire_domain::{Parameters, WiringTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An expression evaluated by the runtime container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Expr {
    /// A literal value
    Literal {
        /// The value
        value: Value,
    },
    /// Another service, through the container getter
    Service {
        /// Canonical service name
        name: String,
    },
    /// The container
    Container,
    /// Constructor call
    Construct {
        /// The class
        class: String,
        /// One argument per declared parameter
        args: Vec<Expr>,
    },
    /// Static factory call
    StaticCall {
        /// Declaring class
        class: String,
        /// Factory name
        method: String,
        /// One argument per declared parameter
        args: Vec<Expr>,
    },
    /// Free function call
    FunctionCall {
        /// Function name
        function: String,
        /// One argument per declared parameter
        args: Vec<Expr>,
    },
    /// Method call on another service
    MethodCall {
        /// Receiver service
        service: String,
        /// Class declaring the method
        class: String,
        /// Method name
        method: String,
        /// One argument per declared parameter
        args: Vec<Expr>,
    },
    /// A list of values
    List {
        /// Items
        items: Vec<Expr>,
    },
}

impl Expr {
    /// A literal
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// A service getter
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service { name: name.into() }
    }
}

/// A setter call applied to the freshly created service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupStep {
    /// Class declaring the setter
    pub class: String,
    /// Setter name
    pub method: String,
    /// One argument per declared parameter
    pub args: Vec<Expr>,
}

/// The factory method of one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMethod {
    /// Generated method name (`create_service_<name>`)
    pub name: String,
    /// Service name
    pub service: String,
    /// Service type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Class of the object the factory yields
    pub class: String,
    /// Whether the instance is cached
    pub shared: bool,
    /// Creates the object
    pub create: Expr,
    /// Applied to the object before it is shared
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<SetupStep>,
}

/// Lookup tables embedded into the generated container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Service name to type
    pub types: BTreeMap<String, String>,
    /// Tag name to tagged services with attribute values
    pub tags: BTreeMap<String, BTreeMap<String, Value>>,
    /// Type to the services implementing it
    pub wiring: WiringTable,
    /// Alias to canonical service name
    pub aliases: BTreeMap<String, String>,
}

/// The compiled container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContainer {
    /// Name of the generated type
    pub class_name: String,
    /// Expanded compile-time parameters
    pub parameters: Parameters,
    /// Factory methods keyed by service name
    pub methods: BTreeMap<String, ServiceMethod>,
    /// Lookup tables
    pub metadata: ContainerMetadata,
    /// Statements evaluated once when the container boots
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initialize: Vec<Expr>,
}

impl GeneratedContainer {
    /// Serialize to the cached JSON artifact
    pub fn to_json(&self) -> autowire_domain::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a cached JSON artifact
    pub fn from_json(text: &str) -> autowire_domain::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
