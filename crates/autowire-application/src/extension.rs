//! Compiler extensions - pluggable passes over the builder
//!
//! An extension owns one configuration section and takes part in three
//! phases, always in registration order:
//!
//! ```text
//! load_configuration ──► before_compile ──► (freeze + generate) ──► after_compile
//!   add definitions        inspect/adjust                            append init code
//! ```
//!
//! During `after_compile` the container is already generated. Extensions
//! reach it through a [`ClassSkeleton`], which only allows appending
//! initialization statements.

use std::collections::BTreeMap;

use autowire_domain::error::Result;
use autowire_domain::value_objects::natural;
use serde_json::Value;

use crate::builder::ContainerBuilder;
use crate::generator::{ContainerMetadata, Expr, GeneratedContainer};
use crate::schema::Schema;

static NULL: Value = Value::Null;

/// A compiler pass
pub trait Extension: Send {
    /// Shape of the extension's configuration section
    fn config_schema(&self) -> Schema {
        Schema::Any
    }

    /// Register definitions from configuration
    fn load_configuration(&mut self, _context: &mut CompilerContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Inspect or adjust definitions once every extension has loaded
    fn before_compile(&mut self, _context: &mut CompilerContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Append initialization statements to the generated container
    fn after_compile(&mut self, _skeleton: &mut ClassSkeleton<'_>) -> Result<()> {
        Ok(())
    }
}

/// What an extension sees while the builder is still mutable
pub struct CompilerContext<'a> {
    name: &'a str,
    builder: &'a mut ContainerBuilder,
    configs: &'a BTreeMap<String, Value>,
}

impl<'a> CompilerContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        builder: &'a mut ContainerBuilder,
        configs: &'a BTreeMap<String, Value>,
    ) -> Self {
        Self {
            name,
            builder,
            configs,
        }
    }

    /// Name the extension was registered under
    pub fn name(&self) -> &str {
        self.name
    }

    /// The extension's own normalised configuration
    pub fn config(&self) -> &Value {
        self.configs.get(self.name).unwrap_or(&NULL)
    }

    /// Normalised configuration of another extension
    pub fn extension_config(&self, name: &str) -> Option<&Value> {
        self.configs.get(name)
    }

    /// The builder
    pub fn builder(&self) -> &ContainerBuilder {
        &*self.builder
    }

    /// The builder, for changes
    pub fn builder_mut(&mut self) -> &mut ContainerBuilder {
        &mut *self.builder
    }

    /// Service name scoped to the extension (`"<extension>.<id>"`)
    pub fn prefix(&self, id: &str) -> String {
        format!("{}.{id}", self.name)
    }
}

/// Append-only view of the generated container
pub struct ClassSkeleton<'a> {
    name: &'a str,
    container: &'a mut GeneratedContainer,
    config: &'a Value,
}

impl<'a> ClassSkeleton<'a> {
    pub(crate) fn new(name: &'a str, container: &'a mut GeneratedContainer, config: &'a Value) -> Self {
        Self {
            name,
            container,
            config,
        }
    }

    /// Name the extension was registered under
    pub fn name(&self) -> &str {
        self.name
    }

    /// The extension's own normalised configuration
    pub fn config(&self) -> &Value {
        self.config
    }

    /// Name of the generated container
    pub fn class_name(&self) -> &str {
        &self.container.class_name
    }

    /// Lookup tables of the generated container
    pub fn metadata(&self) -> &ContainerMetadata {
        &self.container.metadata
    }

    /// Generated service names in natural order
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.container.methods.keys().cloned().collect();
        natural::sort(&mut names);
        names
    }

    /// Statements already appended
    pub fn initializers(&self) -> &[Expr] {
        &self.container.initialize
    }

    /// Append a statement evaluated when the container boots
    pub fn add_initializer(&mut self, statement: Expr) {
        self.container.initialize.push(statement);
    }
}
