//! Compiled registry - the frozen, fully resolved set of definitions

use std::collections::BTreeMap;
use std::sync::Arc;

use autowire_domain::{Parameters, ServiceDefinition, TypeCatalog, WiringTable};
use serde_json::Value;

/// Immutable registry produced by [`crate::ContainerBuilder::freeze`]
///
/// Every definition has a concrete type and a factory whose arguments are
/// listed positionally, one per declared parameter, with references pointing
/// at canonical service names and parameters expanded.
#[derive(Debug, Clone)]
pub struct CompiledRegistry {
    catalog: Arc<TypeCatalog>,
    definitions: BTreeMap<String, ServiceDefinition>,
    aliases: BTreeMap<String, String>,
    parameters: Parameters,
    wiring: WiringTable,
}

impl CompiledRegistry {
    pub(crate) fn new(
        catalog: Arc<TypeCatalog>,
        definitions: BTreeMap<String, ServiceDefinition>,
        aliases: BTreeMap<String, String>,
        parameters: Parameters,
        wiring: WiringTable,
    ) -> Self {
        Self {
            catalog,
            definitions,
            aliases,
            parameters,
            wiring,
        }
    }

    /// The type catalog definitions were resolved against
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Resolved definitions by name
    pub fn definitions(&self) -> &BTreeMap<String, ServiceDefinition> {
        &self.definitions
    }

    /// One resolved definition
    pub fn definition(&self, name: &str) -> Option<&ServiceDefinition> {
        self.definitions
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|target| self.definitions.get(target)))
    }

    /// Aliases mapped straight to canonical names
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Parameters with every placeholder expanded
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The wiring graph
    pub fn wiring(&self) -> &WiringTable {
        &self.wiring
    }

    /// Concrete type of every service
    pub fn types(&self) -> BTreeMap<String, String> {
        self.definitions
            .iter()
            .filter_map(|(name, def)| def.type_name().map(|t| (name.clone(), t.to_string())))
            .collect()
    }

    /// Tag name to tagged services with their attribute values
    pub fn tags(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        let mut tags: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        for (name, def) in &self.definitions {
            for (tag, value) in def.tags() {
                tags.entry(tag.clone())
                    .or_default()
                    .insert(name.clone(), value.clone());
            }
        }
        tags
    }
}
