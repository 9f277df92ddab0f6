//! Service locator port
//!
//! The view of the container handed to factories that declare a
//! `Container` parameter. Application code depends on this trait rather
//! than on the concrete runtime container.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::Instance;
use crate::error::Result;

/// Read access to a running container
pub trait ServiceLocator: Send + Sync {
    /// Get a service by name (or alias)
    fn get(&self, name: &str) -> Result<Instance>;

    /// Whether a service (or alias) with this name exists
    fn has(&self, name: &str) -> bool;

    /// Get the single autowired service of a type
    fn get_by_type(&self, type_name: &str) -> Result<Instance>;

    /// Names of every service of a type, in natural order
    fn find_by_type(&self, type_name: &str) -> Vec<String>;

    /// A compile-time parameter
    fn parameter(&self, key: &str) -> Result<Value>;
}

impl dyn ServiceLocator {
    /// Get a service by name, downcast to a concrete type
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)?.downcast::<T>()
    }

    /// Get a service by type, downcast to a concrete type
    pub fn get_by_type_as<T: Any + Send + Sync>(&self, type_name: &str) -> Result<Arc<T>> {
        self.get_by_type(type_name)?.downcast::<T>()
    }
}
