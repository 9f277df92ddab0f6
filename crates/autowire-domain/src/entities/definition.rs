//! Service definitions and the statements they are built from

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CONTAINER_REFERENCE, METHOD_SEPARATOR, REFERENCE_PREFIX, SELF_REFERENCE};

// ============================================================================
// References, entities and statements
// ============================================================================

/// A pointer to another service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum Reference {
    /// A service by name or alias (normalised to a type lookup when no such
    /// name exists but a type does)
    Service(String),
    /// The single autowired service of a type
    Type(String),
    /// The service under construction (`@self`)
    This,
    /// The container (`@container`)
    Container,
}

impl Reference {
    /// Reference a service by name
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    /// Reference a service by type
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self::Type(type_name.into())
    }

    /// Parse `"@name"`, `"@self"` and `"@container"`
    pub fn parse(text: &str) -> Option<Self> {
        let name = text.strip_prefix(REFERENCE_PREFIX)?;
        match name {
            "" => None,
            SELF_REFERENCE => Some(Self::This),
            CONTAINER_REFERENCE => Some(Self::Container),
            other => Some(Self::Service(other.to_string())),
        }
    }
}

/// What a statement calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Constructor of a class (or a free function of the same name)
    Class(String),
    /// Static factory `Class::method`
    StaticMethod {
        /// Declaring class
        class: String,
        /// Factory name
        method: String,
    },
    /// Free factory function
    Function(String),
    /// Method invoked on another service, `@service::method`
    ServiceMethod {
        /// The receiver
        service: Reference,
        /// Method name
        method: String,
    },
    /// The definition is another service
    Reference(Reference),
}

impl Entity {
    /// Parse `"Class"`, `"Class::method"`, `"@service"` and `"@service::method"`
    pub fn parse(text: &str) -> Self {
        match text.split_once(METHOD_SEPARATOR) {
            Some((receiver, method)) => match Reference::parse(receiver) {
                Some(service) => Self::ServiceMethod {
                    service,
                    method: method.to_string(),
                },
                None => Self::StaticMethod {
                    class: receiver.to_string(),
                    method: method.to_string(),
                },
            },
            None => match Reference::parse(text) {
                Some(reference) => Self::Reference(reference),
                None => Self::Class(text.to_string()),
            },
        }
    }

    /// Short human-readable form used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Class(class) => class.clone(),
            Self::StaticMethod { class, method } => format!("{class}::{method}()"),
            Self::Function(name) => format!("{name}()"),
            Self::ServiceMethod { service, method } => {
                format!("{}::{method}()", describe_reference(service))
            }
            Self::Reference(reference) => describe_reference(reference),
        }
    }
}

fn describe_reference(reference: &Reference) -> String {
    match reference {
        Reference::Service(name) => format!("@{name}"),
        Reference::Type(type_name) => format!("@{type_name}"),
        Reference::This => format!("@{SELF_REFERENCE}"),
        Reference::Container => format!("@{CONTAINER_REFERENCE}"),
    }
}

/// Positional and named arguments of a call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    /// Arguments bound by position
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional: Vec<Argument>,
    /// Arguments bound by parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named: BTreeMap<String, Argument>,
}

impl Arguments {
    /// No arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments only
    pub fn positional(arguments: Vec<Argument>) -> Self {
        Self {
            positional: arguments,
            named: BTreeMap::new(),
        }
    }

    /// Whether no argument is supplied
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// A supplied argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// A literal JSON value; `%placeholders%` are expanded at compile time
    Value(Value),
    /// A reference to a service
    Reference(Reference),
    /// A nested call constructing an inline object
    Statement(Box<Statement>),
    /// A list of arguments
    List(Vec<Argument>),
}

impl Argument {
    /// A literal argument
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// A reference to a named service
    pub fn service(name: impl Into<String>) -> Self {
        Self::Reference(Reference::service(name))
    }

    /// A reference to the autowired service of a type
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self::Reference(Reference::of_type(type_name))
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Reference> for Argument {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

impl From<Statement> for Argument {
    fn from(statement: Statement) -> Self {
        Self::Statement(Box::new(statement))
    }
}

/// A call: entity plus arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// What is called
    pub entity: Entity,
    /// Supplied arguments
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
}

impl Statement {
    /// A statement without arguments
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            arguments: Arguments::new(),
        }
    }

    /// Call a class constructor
    pub fn class(class: impl Into<String>) -> Self {
        Self::new(Entity::Class(class.into()))
    }

    /// Call a static factory
    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(Entity::StaticMethod {
            class: class.into(),
            method: method.into(),
        })
    }

    /// Call a free function
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(Entity::Function(name.into()))
    }

    /// Call a method on another service
    pub fn service_method(service: Reference, method: impl Into<String>) -> Self {
        Self::new(Entity::ServiceMethod {
            service,
            method: method.into(),
        })
    }

    /// Reuse another service
    pub fn reference(reference: Reference) -> Self {
        Self::new(Entity::Reference(reference))
    }

    /// Append a positional argument
    #[must_use]
    pub fn arg(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments.positional.push(argument.into());
        self
    }

    /// Bind a named argument
    #[must_use]
    pub fn named_arg(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.arguments.named.insert(name.into(), argument.into());
        self
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Self::new(Entity::parse(text))
    }
}

/// A method call performed on the service right after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupCall {
    /// Setter name
    pub method: String,
    /// Supplied arguments
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
}

impl SetupCall {
    /// A setup call without arguments
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Arguments::new(),
        }
    }

    /// Append a positional argument
    #[must_use]
    pub fn arg(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments.positional.push(argument.into());
        self
    }

    /// Bind a named argument
    #[must_use]
    pub fn named_arg(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.arguments.named.insert(name.into(), argument.into());
        self
    }
}

// ============================================================================
// Service definition
// ============================================================================

/// How one service is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
    factory: Option<Statement>,
    setup: Vec<SetupCall>,
    tags: BTreeMap<String, Value>,
    autowired: bool,
    shared: bool,
}

impl ServiceDefinition {
    /// A new autowired, shared definition without factory
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            factory: None,
            setup: Vec::new(),
            tags: BTreeMap::new(),
            autowired: true,
            shared: true,
        }
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Declared type
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Declare the type
    pub fn set_type(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Factory statement
    pub fn factory(&self) -> Option<&Statement> {
        self.factory.as_ref()
    }

    /// Replace the factory
    pub fn set_factory(&mut self, factory: impl Into<Statement>) -> &mut Self {
        self.factory = Some(factory.into());
        self
    }

    /// Factory arguments (empty when there is no factory yet)
    pub fn arguments(&self) -> Option<&Arguments> {
        self.factory.as_ref().map(|f| &f.arguments)
    }

    /// Append a positional factory argument
    ///
    /// Without a factory, the declared type's constructor becomes the factory.
    pub fn add_argument(&mut self, argument: impl Into<Argument>) -> &mut Self {
        self.factory_mut().arguments.positional.push(argument.into());
        self
    }

    /// Bind a named factory argument
    pub fn set_argument(&mut self, name: impl Into<String>, argument: impl Into<Argument>) -> &mut Self {
        self.factory_mut()
            .arguments
            .named
            .insert(name.into(), argument.into());
        self
    }

    /// Replace every factory argument
    pub fn set_arguments(&mut self, arguments: Arguments) -> &mut Self {
        self.factory_mut().arguments = arguments;
        self
    }

    fn factory_mut(&mut self) -> &mut Statement {
        let type_name = self.type_name.clone().unwrap_or_default();
        self.factory
            .get_or_insert_with(|| Statement::class(type_name))
    }

    /// Setup calls
    pub fn setup(&self) -> &[SetupCall] {
        &self.setup
    }

    /// Append a setup call
    pub fn add_setup(&mut self, call: SetupCall) -> &mut Self {
        self.setup.push(call);
        self
    }

    /// Replace every setup call
    pub fn set_setup(&mut self, setup: Vec<SetupCall>) -> &mut Self {
        self.setup = setup;
        self
    }

    /// Tags with their attribute values
    pub fn tags(&self) -> &BTreeMap<String, Value> {
        &self.tags
    }

    /// Attribute of one tag
    pub fn tag(&self, name: &str) -> Option<&Value> {
        self.tags.get(name)
    }

    /// Attach a tag
    pub fn add_tag(&mut self, name: impl Into<String>, attributes: impl Into<Value>) -> &mut Self {
        self.tags.insert(name.into(), attributes.into());
        self
    }

    /// Detach a tag
    pub fn remove_tag(&mut self, name: &str) -> &mut Self {
        self.tags.remove(name);
        self
    }

    /// Whether the service takes part in by-type resolution
    pub fn is_autowired(&self) -> bool {
        self.autowired
    }

    /// Include or exclude the service from by-type resolution
    pub fn set_autowired(&mut self, autowired: bool) -> &mut Self {
        self.autowired = autowired;
        self
    }

    /// Whether a single instance is cached and reused
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Switch between singleton and per-call construction
    pub fn set_shared(&mut self, shared: bool) -> &mut Self {
        self.shared = shared;
        self
    }
}
