//! Resolved arguments handed to constructors, factories and setters

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::catalog::Instance;
use crate::error::{Error, Result};
use crate::ports::ServiceLocator;

/// One resolved argument value
#[derive(Clone)]
pub enum ArgValue {
    /// A literal JSON value (parameters already expanded)
    Value(Value),
    /// A service or an inline-constructed object
    Service(Instance),
    /// A list of values, e.g. every service implementing a type
    List(Vec<ArgValue>),
    /// The container itself
    Locator(Arc<dyn ServiceLocator>),
}

impl std::fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Service(instance) => f.debug_tuple("Service").field(instance).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Locator(_) => f.write_str("Locator"),
        }
    }
}

/// Named argument list in declaration order
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(String, ArgValue)>,
}

impl Args {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.push(name, value);
        self
    }

    /// Append a named value in place
    pub fn push(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.push((name.into(), value));
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Raw access to a named argument
    pub fn get(&self, name: &str) -> Result<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
            .ok_or_else(|| Error::invalid_state(format!("Argument '{name}' was not supplied")))
    }

    /// The service instance passed as `name`
    pub fn instance(&self, name: &str) -> Result<&Instance> {
        match self.get(name)? {
            ArgValue::Service(instance) => Ok(instance),
            other => Err(unexpected(name, "a service", other)),
        }
    }

    /// The service passed as `name`, downcast to a concrete type
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.instance(name)?.downcast::<T>()
    }

    /// The service passed as `name`, or `None` when `null` was injected
    pub fn optional_service<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        match self.get(name)? {
            ArgValue::Value(Value::Null) => Ok(None),
            ArgValue::Service(instance) => instance.downcast::<T>().map(Some),
            other => Err(unexpected(name, "a service or null", other)),
        }
    }

    /// The service passed as `name`, cast to a trait object
    pub fn interface<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<I>> {
        self.instance(name)?.cast::<I>()
    }

    /// Every service passed as the list `name`
    pub fn instances(&self, name: &str) -> Result<Vec<Instance>> {
        match self.get(name)? {
            ArgValue::List(items) => items
                .iter()
                .map(|item| match item {
                    ArgValue::Service(instance) => Ok(instance.clone()),
                    other => Err(unexpected(name, "a list of services", other)),
                })
                .collect(),
            other => Err(unexpected(name, "a list of services", other)),
        }
    }

    /// Every service passed as the list `name`, cast to a trait object
    pub fn interfaces<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Vec<Arc<I>>> {
        self.instances(name)?
            .iter()
            .map(Instance::cast::<I>)
            .collect()
    }

    /// A literal argument deserialized into `V`
    pub fn value<V: DeserializeOwned>(&self, name: &str) -> Result<V> {
        match self.get(name)? {
            ArgValue::Value(value) => serde_json::from_value(value.clone()).map_err(|e| {
                Error::invalid_state(format!("Argument '{name}' has an unexpected shape: {e}"))
            }),
            other => Err(unexpected(name, "a literal value", other)),
        }
    }

    /// The container passed as `name`
    pub fn locator(&self, name: &str) -> Result<Arc<dyn ServiceLocator>> {
        match self.get(name)? {
            ArgValue::Locator(locator) => Ok(Arc::clone(locator)),
            other => Err(unexpected(name, "the container", other)),
        }
    }
}

fn unexpected(name: &str, expected: &str, got: &ArgValue) -> Error {
    let kind = match got {
        ArgValue::Value(_) => "a literal value",
        ArgValue::Service(_) => "a service",
        ArgValue::List(_) => "a list",
        ArgValue::Locator(_) => "the container",
    };
    Error::invalid_state(format!("Argument '{name}' must be {expected}, {kind} given"))
}
