//! Declared signatures: parameters, constructors, factories and setters
//!
//! A signature is what reflection would have told us about a constructor:
//! the ordered parameter list with type hints and defaults, plus an invoker
//! that performs the call once arguments are resolved.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::catalog::{Args, Instance, Object};
use crate::error::Result;

/// Performs a constructor, static factory or function call
pub type Invoker = Arc<dyn Fn(&Args) -> Result<Object> + Send + Sync>;

/// Mutates a constructed object before it is shared
pub type SetterFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), &Args) -> Result<()> + Send + Sync>;

/// Produces an object from an already shared service
pub type MethodFn = Arc<dyn Fn(&Instance, &Args) -> Result<Object> + Send + Sync>;

/// What a parameter expects, used for autowiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "type")]
pub enum TypeHint {
    /// A single service of the given type
    Service(String),
    /// Every autowired service of the given type
    Services(String),
    /// A literal value, never autowired
    Value,
    /// The container itself
    Container,
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, used for named arguments and error messages
    pub name: String,
    /// Type hint
    pub hint: TypeHint,
    /// Value used when nothing is supplied and autowiring fails
    pub default: Option<Value>,
    /// Whether `null` is acceptable when autowiring fails
    pub nullable: bool,
}

impl Parameter {
    /// A parameter expecting one service of `type_name`
    pub fn service(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Service(type_name.into()))
    }

    /// A parameter expecting every service of `type_name`
    pub fn services(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Services(type_name.into()))
    }

    /// A literal parameter
    pub fn value(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Value)
    }

    /// A parameter receiving the container
    pub fn container(name: impl Into<String>) -> Self {
        Self::with_hint(name, TypeHint::Container)
    }

    fn with_hint(name: impl Into<String>, hint: TypeHint) -> Self {
        Self {
            name: name.into(),
            hint,
            default: None,
            nullable: false,
        }
    }

    /// Declare a default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Accept `null` when the dependency cannot be resolved
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Whether a value must be supplied or autowired
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.nullable
    }
}

/// A constructor, static factory or free function
#[derive(Clone)]
pub struct Callable {
    /// Declared parameters
    pub params: Vec<Parameter>,
    /// Declared return type (the class itself for constructors)
    pub returns: String,
    /// The call
    pub invoke: Invoker,
}

impl Callable {
    /// Create a callable from a typed closure
    pub fn new<T, F>(returns: impl Into<String>, params: Vec<Parameter>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            params,
            returns: returns.into(),
            invoke: Arc::new(move |args| f(args).map(|value| Box::new(value) as Object)),
        }
    }

    /// Parameters and return type, without the invoker
    pub fn signature(&self) -> Value {
        json!({ "params": self.params, "returns": self.returns })
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// A post-construction method call
#[derive(Clone)]
pub struct Setter {
    /// Declared parameters
    pub params: Vec<Parameter>,
    /// The call
    pub invoke: SetterFn,
}

impl Setter {
    /// Parameters, without the invoker
    pub fn signature(&self) -> Value {
        json!({ "params": self.params })
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A method producing an object from a shared service
#[derive(Clone)]
pub struct Method {
    /// Declared parameters
    pub params: Vec<Parameter>,
    /// Declared return type
    pub returns: String,
    /// The call
    pub invoke: MethodFn,
}

impl Method {
    /// Parameters and return type, without the invoker
    pub fn signature(&self) -> Value {
        json!({ "params": self.params, "returns": self.returns })
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}
