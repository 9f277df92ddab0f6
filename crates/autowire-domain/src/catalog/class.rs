//! Class metadata declared by application code

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::catalog::callable::{Callable, Method, Parameter, Setter};
use crate::catalog::{Args, CastTable, Caster, Object};
use crate::error::{Error, Result};

/// Whether a declared type can be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// A concrete class
    Class,
    /// A class that cannot be constructed on its own
    Abstract,
    /// An interface (trait)
    Interface,
}

/// Everything the container knows about one type
#[derive(Clone)]
pub struct ClassInfo {
    name: String,
    kind: ClassKind,
    parent: Option<String>,
    interfaces: Vec<String>,
    constructor: Option<Callable>,
    factories: BTreeMap<String, Callable>,
    setters: BTreeMap<String, Setter>,
    methods: BTreeMap<String, Method>,
    casts: CastTable,
}

impl ClassInfo {
    fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            factories: BTreeMap::new(),
            setters: BTreeMap::new(),
            methods: BTreeMap::new(),
            casts: CastTable::new(),
        }
    }

    /// Declare a concrete class
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    /// Declare an abstract class
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Abstract)
    }

    /// Declare an interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    /// Set the parent class (for interfaces: a parent interface)
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        if self.kind == ClassKind::Interface {
            self.interfaces.push(parent);
        } else {
            self.parent = Some(parent);
        }
        self
    }

    /// Declare an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    /// Declare an implemented interface together with its trait-object cast
    #[must_use]
    pub fn implements_as<T, I>(self, interface: impl Into<String>, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
    {
        let interface = interface.into();
        let caster: Caster = Arc::new(move |object| {
            object
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(cast(concrete)) as Object)
        });
        let mut this = self.implements(interface.clone());
        this.casts.insert(interface, caster);
        this
    }

    /// Declare the constructor
    #[must_use]
    pub fn constructor<T, F>(mut self, params: Vec<Parameter>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Callable::new(self.name.clone(), params, f));
        self
    }

    /// Declare a static factory method returning `returns`
    #[must_use]
    pub fn factory<T, F>(
        mut self,
        method: impl Into<String>,
        returns: impl Into<String>,
        params: Vec<Parameter>,
        f: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        self.factories
            .insert(method.into(), Callable::new(returns, params, f));
        self
    }

    /// Declare a setter usable in setup calls
    #[must_use]
    pub fn setter<T, F>(mut self, method: impl Into<String>, params: Vec<Parameter>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut T, &Args) -> Result<()> + Send + Sync + 'static,
    {
        let method = method.into();
        let class = self.name.clone();
        let label = method.clone();
        let setter = Setter {
            params,
            invoke: Arc::new(move |object, args| {
                let target = object.downcast_mut::<T>().ok_or_else(|| {
                    Error::type_mismatch(format!("{class}::{label}()"), class.as_str(), type_name::<T>())
                })?;
                f(target, args)
            }),
        };
        self.setters.insert(method, setter);
        self
    }

    /// Declare a method producing an object from a shared instance
    #[must_use]
    pub fn method<T, R, F>(
        mut self,
        method: impl Into<String>,
        returns: impl Into<String>,
        params: Vec<Parameter>,
        f: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(&T, &Args) -> Result<R> + Send + Sync + 'static,
    {
        let method_fn = Method {
            params,
            returns: returns.into(),
            invoke: Arc::new(move |instance, args| {
                let target = instance.downcast::<T>()?;
                f(&target, args).map(|value| Box::new(value) as Object)
            }),
        };
        self.methods.insert(method.into(), method_fn);
        self
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of type
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether instances can be created through the constructor
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Class
    }

    /// Direct parent class
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Directly implemented (or, for interfaces, extended) interfaces
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Declared constructor
    pub fn constructor_fn(&self) -> Option<&Callable> {
        self.constructor.as_ref()
    }

    /// Declared static factory
    pub fn factory_fn(&self, method: &str) -> Option<&Callable> {
        self.factories.get(method)
    }

    /// Declared setter
    pub fn setter_fn(&self, method: &str) -> Option<&Setter> {
        self.setters.get(method)
    }

    /// Declared instance method
    pub fn method_fn(&self, method: &str) -> Option<&Method> {
        self.methods.get(method)
    }

    /// Interface casts
    pub fn casts(&self) -> &CastTable {
        &self.casts
    }

    /// Everything autowiring reads from this class, without the invokers
    ///
    /// Two classes with the same signature compile to the same container.
    pub fn signature(&self) -> Value {
        fn table<T>(entries: &BTreeMap<String, T>, describe: fn(&T) -> Value) -> Value {
            Value::Object(
                entries
                    .iter()
                    .map(|(name, entry)| (name.clone(), describe(entry)))
                    .collect::<Map<String, Value>>(),
            )
        }

        json!({
            "kind": self.kind,
            "parent": self.parent,
            "interfaces": self.interfaces,
            "casts": self.casts.keys().collect::<Vec<_>>(),
            "constructor": self.constructor.as_ref().map(Callable::signature),
            "factories": table(&self.factories, Callable::signature),
            "setters": table(&self.setters, Setter::signature),
            "methods": table(&self.methods, Method::signature),
        })
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .field("constructor", &self.constructor)
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("casts", &self.casts.keys().collect::<Vec<_>>())
            .finish()
    }
}
