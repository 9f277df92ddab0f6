//! Type-erased service objects

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A freshly constructed object, still exclusively owned
///
/// Setters run against the object while it is in this form; it is frozen
/// into an [`Instance`] afterwards.
pub type Object = Box<dyn Any + Send + Sync>;

/// Converts a shared concrete object into a boxed `Arc<dyn Trait>`
pub type Caster = Arc<dyn Fn(Arc<dyn Any + Send + Sync>) -> Option<Object> + Send + Sync>;

/// Interface casts of one class, keyed by interface name
pub type CastTable = BTreeMap<String, Caster>;

/// A shared service object tagged with its class name
#[derive(Clone)]
pub struct Instance {
    class: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
    casts: Arc<CastTable>,
}

impl Instance {
    /// Wrap a value under the given class name
    pub fn new<T: Any + Send + Sync>(class: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            class: class.into(),
            object: Arc::new(value),
            casts: Arc::new(CastTable::new()),
        }
    }

    /// Wrap an already shared value under the given class name
    pub fn from_arc<T: Any + Send + Sync>(class: impl Into<Arc<str>>, value: Arc<T>) -> Self {
        Self {
            class: class.into(),
            object: value,
            casts: Arc::new(CastTable::new()),
        }
    }

    /// Freeze a constructed object
    pub fn from_object(class: impl Into<Arc<str>>, object: Object, casts: Arc<CastTable>) -> Self {
        Self {
            class: class.into(),
            object: Arc::from(object),
            casts,
        }
    }

    /// Replace the interface casts (the container attaches the class's casts)
    #[must_use]
    pub fn with_casts(mut self, casts: Arc<CastTable>) -> Self {
        self.casts = casts;
        self
    }

    /// Class name the object was registered under
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The shared object
    pub fn object(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.object
    }

    /// Downcast to a concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        Arc::clone(&self.object)
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(self.class(), type_name::<T>(), self.class()))
    }

    /// Borrow as a concrete type
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Cast to a trait object through one of the registered interface casts
    pub fn cast<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
        self.casts
            .values()
            .filter_map(|caster| caster(Arc::clone(&self.object)))
            .find_map(|boxed| boxed.downcast_ref::<Arc<I>>().cloned())
            .ok_or_else(|| Error::type_mismatch(self.class(), type_name::<I>(), self.class()))
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .field("casts", &self.casts.keys().collect::<Vec<_>>())
            .finish()
    }
}
