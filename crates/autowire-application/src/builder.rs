//! Container Builder - the mutable service registry of the compile phase
//!
//! Collects service definitions, interface definitions, aliases and
//! parameters. Every mutation invalidates the wiring graph, which is rebuilt
//! on the next by-type or by-tag lookup, so extensions always observe the
//! registry as it currently is.
//!
//! ```text
//! register / add_alias / set_parameter        find_by_type / find_by_tag
//!        │                                              ▲
//!        ▼                                              │
//! ┌──────────────────┐   freeze(self)   ┌───────────────────────┐
//! │ ContainerBuilder │ ───────────────► │ CompiledRegistry      │
//! │  (mutable)       │                  │  (immutable, resolved) │
//! └──────────────────┘                  └───────────────────────┘
//! ```
//!
//! Freezing consumes the builder; mutating a compiled registry is not
//! expressible.

use std::cell::OnceCell;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::{natural, suggestion};
use autowire_domain::{InterfaceDefinition, Parameters, ServiceDefinition, Statement, TypeCatalog, WiringTable};
use serde_json::Value;
use tracing::debug;

use crate::registry::CompiledRegistry;
use crate::resolver::Resolver;

/// Mutable registry of service definitions
#[derive(Debug)]
pub struct ContainerBuilder {
    catalog: Arc<TypeCatalog>,
    definitions: BTreeMap<String, ServiceDefinition>,
    interfaces: BTreeMap<String, InterfaceDefinition>,
    aliases: BTreeMap<String, String>,
    parameters: Parameters,
    wiring: OnceCell<WiringTable>,
}

impl ContainerBuilder {
    /// Create an empty builder over a type catalog
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            definitions: BTreeMap::new(),
            interfaces: BTreeMap::new(),
            aliases: BTreeMap::new(),
            parameters: Parameters::new(),
            wiring: OnceCell::new(),
        }
    }

    /// The type catalog
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    fn invalidate(&mut self) {
        self.wiring.take();
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    /// Register a service, replacing any previous definition or alias with
    /// the same name
    pub fn register(&mut self, name: impl Into<String>, factory: impl Into<Statement>) -> &mut ServiceDefinition {
        let name = name.into();
        self.invalidate();
        self.aliases.remove(&name);
        self.interfaces.remove(&name);
        debug!(service = %name, "Registering service");

        let mut definition = ServiceDefinition::new(name.clone());
        definition.set_factory(factory);
        match self.definitions.entry(name) {
            Entry::Occupied(mut slot) => {
                slot.insert(definition);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(definition),
        }
    }

    /// Add an empty definition; the name must be free
    pub fn add_definition(&mut self, name: impl Into<String>) -> Result<&mut ServiceDefinition> {
        let name = name.into();
        self.ensure_free(&name)?;
        self.invalidate();
        debug!(service = %name, "Adding definition");
        Ok(self
            .definitions
            .entry(name)
            .or_insert_with_key(|key| ServiceDefinition::new(key.clone())))
    }

    /// Add an interface definition; the name must be free
    pub fn add_interface_definition(&mut self, name: impl Into<String>) -> Result<&mut InterfaceDefinition> {
        let name = name.into();
        self.ensure_free(&name)?;
        self.invalidate();
        debug!(service = %name, "Adding interface definition");
        Ok(self
            .interfaces
            .entry(name)
            .or_insert_with_key(|key| InterfaceDefinition::new(key.clone())))
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::configuration("Service name must be a non-empty string"));
        }
        if self.definitions.contains_key(name) || self.interfaces.contains_key(name) {
            return Err(Error::configuration(format!("Service '{name}' has already been added.")));
        }
        if self.aliases.contains_key(name) {
            return Err(Error::configuration(format!(
                "Service '{name}' has already been added as an alias."
            )));
        }
        Ok(())
    }

    /// Remove a definition (plain or interface)
    pub fn remove_definition(&mut self, name: &str) -> bool {
        self.invalidate();
        self.definitions.remove(name).is_some() || self.interfaces.remove(name).is_some()
    }

    /// Whether a definition (plain or interface) or alias with this name exists
    pub fn has_definition(&self, name: &str) -> bool {
        let name = self.resolve_alias(name);
        self.definitions.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// A plain definition, following aliases
    pub fn get_definition(&self, name: &str) -> Result<&ServiceDefinition> {
        let canonical = self.resolve_alias(name);
        self.definitions
            .get(canonical)
            .ok_or_else(|| self.missing_service(name))
    }

    /// A plain definition for in-place changes, following aliases
    pub fn get_definition_mut(&mut self, name: &str) -> Result<&mut ServiceDefinition> {
        let canonical = self.resolve_alias(name).to_string();
        if !self.definitions.contains_key(&canonical) {
            return Err(self.missing_service(name));
        }
        self.invalidate();
        self.definitions
            .get_mut(&canonical)
            .ok_or_else(|| Error::service_not_found(name))
    }

    /// An interface definition
    pub fn get_interface_definition(&self, name: &str) -> Option<&InterfaceDefinition> {
        self.interfaces.get(self.resolve_alias(name))
    }

    /// Plain definitions in name order
    pub fn definitions(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.values()
    }

    /// Interface definitions in name order
    pub fn interface_definitions(&self) -> impl Iterator<Item = &InterfaceDefinition> {
        self.interfaces.values()
    }

    /// Every service name, plain and interface, in natural order
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .definitions
            .keys()
            .chain(self.interfaces.keys())
            .cloned()
            .collect();
        natural::sort(&mut names);
        names
    }

    pub(crate) fn missing_service(&self, name: &str) -> Error {
        let names = self.service_names();
        let candidates = names
            .iter()
            .map(String::as_str)
            .chain(self.aliases.keys().map(String::as_str));
        match suggestion::hint(candidates, name) {
            Some(hint) => Error::service_not_found_with_hint(name, hint),
            None => Error::service_not_found(name),
        }
    }

    // ========================================================================
    // Aliases
    // ========================================================================

    /// Make `alias` another name for `target`
    ///
    /// The target does not need to exist yet; it is validated on freeze.
    /// Aliases that would form a cycle are rejected here.
    pub fn add_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        let target = target.into();
        if alias.is_empty() || target.is_empty() {
            return Err(Error::configuration("Alias and target must be non-empty strings"));
        }
        if self.definitions.contains_key(&alias) || self.interfaces.contains_key(&alias) {
            return Err(Error::configuration(format!(
                "Service '{alias}' has already been added."
            )));
        }

        let mut chain = vec![alias.clone()];
        let mut current = target.as_str();
        loop {
            chain.push(current.to_string());
            if current == alias {
                return Err(Error::configuration(format!(
                    "Alias cycle detected: {}",
                    chain.join(" -> ")
                )));
            }
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }

        debug!(alias = %alias, target = %target, "Adding alias");
        self.invalidate();
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Remove an alias
    pub fn remove_alias(&mut self, alias: &str) -> bool {
        self.invalidate();
        self.aliases.remove(alias).is_some()
    }

    /// Aliases and their direct targets
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Follow aliases to the canonical service name
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        let mut seen = BTreeSet::new();
        while let Some(next) = self.aliases.get(current) {
            if !seen.insert(current) {
                break;
            }
            current = next;
        }
        current
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Set a parameter by dotted key
    pub fn set_parameter(&mut self, key: &str, value: Value) -> Result<()> {
        self.parameters.set(key, value)
    }

    /// Look up a parameter by dotted key, placeholders left unexpanded
    pub fn get_parameter(&self, key: &str) -> Result<&Value> {
        self.parameters.get(key)
    }

    /// Deep-merge parameters into the current ones
    pub fn add_parameters(&mut self, parameters: &Parameters) {
        self.parameters.merge(parameters);
    }

    /// Every parameter
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// The wiring graph of the current registry
    pub fn wiring(&self) -> &WiringTable {
        self.wiring
            .get_or_init(|| Resolver::new(self).build_wiring())
    }

    /// Every service of a type, autowired or not, in natural order
    pub fn find_by_type(&self, type_name: &str) -> Vec<String> {
        self.wiring().all(type_name)
    }

    /// Autowired services of a type, in natural order
    pub fn find_autowired(&self, type_name: &str) -> Vec<String> {
        self.wiring().autowired(type_name).to_vec()
    }

    /// The single autowired service of a type
    pub fn resolve_by_type(&self, type_name: &str) -> Result<String> {
        let wiring = self.wiring();
        let known = self.catalog.contains(type_name) || wiring.entry(type_name).is_some();
        wiring.resolve(type_name, known)
    }

    /// Services carrying a tag, with the tag's attribute value
    pub fn find_by_tag(&self, tag: &str) -> BTreeMap<String, Value> {
        let plain = self
            .definitions
            .iter()
            .filter_map(|(name, def)| def.tag(tag).map(|value| (name.clone(), value.clone())));
        let bound = self.interfaces.iter().filter_map(|(name, def)| {
            def.result()
                .tag(tag)
                .or_else(|| def.tags().get(tag))
                .map(|value| (name.clone(), value.clone()))
        });
        plain.chain(bound).collect()
    }

    // ========================================================================
    // Freeze
    // ========================================================================

    /// Resolve every definition and freeze the registry
    pub fn freeze(self) -> Result<CompiledRegistry> {
        let resolver = Resolver::new(&self);
        let compiled = resolver.complete()?;
        debug!(services = compiled.definitions().len(), "Registry frozen");
        Ok(compiled)
    }

    pub(crate) fn definition_map(&self) -> &BTreeMap<String, ServiceDefinition> {
        &self.definitions
    }

    pub(crate) fn interface_map(&self) -> &BTreeMap<String, InterfaceDefinition> {
        &self.interfaces
    }
}
