//! Type Catalog - explicit class metadata for autowiring
//!
//! Autowiring needs to know, for every type, its ancestors and its
//! constructor signature. Rust has no runtime reflection, so application
//! code declares that metadata once in a [`TypeCatalog`]:
//!
//! ```text
//! ClassInfo::class("App")            ClassInfo::interface("LoggerInterface")
//!   .constructor([logger: Logger])            ▲
//!                                             │ implements_as
//! ClassInfo::class("Logger") ─────────────────┘
//! ```
//!
//! The compile phase reads signatures and hierarchies from the catalog; the
//! runtime phase only uses the invokers bound to the generated plan.

pub mod args;
pub mod callable;
pub mod class;
pub mod instance;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde_json::{Map, Value, json};

pub use args::{ArgValue, Args};
pub use callable::{Callable, Invoker, Method, MethodFn, Parameter, Setter, SetterFn, TypeHint};
pub use class::{ClassInfo, ClassKind};
pub use instance::{CastTable, Caster, Instance, Object};

use crate::error::Result;

/// Registry of declared types and free factory functions
#[derive(Clone, Default)]
pub struct TypeCatalog {
    types: BTreeMap<String, ClassInfo>,
    functions: BTreeMap<String, Callable>,
}

impl TypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type, replacing any previous declaration with the same name
    #[must_use]
    pub fn with(mut self, class: ClassInfo) -> Self {
        self.register(class);
        self
    }

    /// Declare a type in place
    pub fn register(&mut self, class: ClassInfo) {
        self.types.insert(class.name().to_string(), class);
    }

    /// Declare a free factory function
    #[must_use]
    pub fn with_function<T, F>(
        mut self,
        name: impl Into<String>,
        returns: impl Into<String>,
        params: Vec<Parameter>,
        f: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.into(), Callable::new(returns, params, f));
        self
    }

    /// Look up a type
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.types.get(name)
    }

    /// Whether a type is declared
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Look up a free function
    pub fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    /// Declared type names in order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Declared function names in order
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Canonical description of every type and function, in name order
    pub fn signature(&self) -> Value {
        let types: Map<String, Value> = self
            .types
            .iter()
            .map(|(name, class)| (name.clone(), class.signature()))
            .collect();
        let functions: Map<String, Value> = self
            .functions
            .iter()
            .map(|(name, function)| (name.clone(), function.signature()))
            .collect();
        json!({ "types": types, "functions": functions })
    }

    /// The type itself followed by every ancestor, breadth first
    ///
    /// Undeclared ancestors are still listed (they cannot be expanded
    /// further); hierarchy cycles are cut.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(class) = self.types.get(&current) {
                queue.extend(class.parent().map(str::to_string));
                queue.extend(class.interfaces().iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// Whether `class` is `type_name` or one of its descendants
    pub fn is_a(&self, class: &str, type_name: &str) -> bool {
        class == type_name || self.ancestors(class).iter().any(|t| t == type_name)
    }

    /// Interface casts of a class merged with the casts of its ancestors
    pub fn casts_of(&self, class: &str) -> CastTable {
        let mut casts = CastTable::new();
        for ancestor in self.ancestors(class).iter().rev() {
            if let Some(info) = self.types.get(ancestor) {
                for (name, caster) in info.casts() {
                    casts.insert(name.clone(), caster.clone());
                }
            }
        }
        casts
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
