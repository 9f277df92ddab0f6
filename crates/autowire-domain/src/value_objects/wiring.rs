//! Wiring graph - which services provide which type
//!
//! Every service is indexed under its own type and under every ancestor of
//! that type (parent classes, interfaces, interface parents). Autowired and
//! non-autowired services are kept apart: only autowired ones take part in
//! by-type resolution, the others only feed error hints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value_objects::natural;

/// Services registered under one type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringEntry {
    /// Services that take part in autowiring, in natural order
    pub autowired: Vec<String>,
    /// Services of this type excluded from autowiring, in natural order
    pub other: Vec<String>,
}

/// Mapping from type name to the services implementing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WiringTable {
    types: BTreeMap<String, WiringEntry>,
}

impl WiringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `service` under `type_name`
    pub fn add(&mut self, type_name: &str, service: &str, autowired: bool) {
        let entry = self.types.entry(type_name.to_string()).or_default();
        let list = if autowired {
            &mut entry.autowired
        } else {
            &mut entry.other
        };
        if !list.iter().any(|s| s == service) {
            list.push(service.to_string());
            natural::sort(list);
        }
    }

    /// Remove `service` from every type
    pub fn remove_service(&mut self, service: &str) {
        for entry in self.types.values_mut() {
            entry.autowired.retain(|s| s != service);
            entry.other.retain(|s| s != service);
        }
        self.types
            .retain(|_, entry| !entry.autowired.is_empty() || !entry.other.is_empty());
    }

    /// The entry for a type, if any service provides it
    pub fn entry(&self, type_name: &str) -> Option<&WiringEntry> {
        self.types.get(type_name)
    }

    /// Autowired services of a type, in natural order
    pub fn autowired(&self, type_name: &str) -> &[String] {
        self.types
            .get(type_name)
            .map(|entry| entry.autowired.as_slice())
            .unwrap_or_default()
    }

    /// Every service of a type, autowired or not, in natural order
    pub fn all(&self, type_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .get(type_name)
            .map(|entry| entry.autowired.iter().chain(&entry.other).cloned().collect())
            .unwrap_or_default();
        natural::sort(&mut names);
        names
    }

    /// Iterate over indexed types
    pub fn types(&self) -> impl Iterator<Item = (&String, &WiringEntry)> {
        self.types.iter()
    }

    /// Resolve a type to its single autowired service
    ///
    /// `type_exists` tells whether the type is declared at all, so that a
    /// missing declaration and a missing registration produce different
    /// errors.
    pub fn resolve(&self, type_name: &str, type_exists: bool) -> Result<String> {
        let entry = self.types.get(type_name);
        match entry.map(|e| e.autowired.as_slice()).unwrap_or_default() {
            [single] => Ok(single.clone()),
            [] => match entry {
                None if !type_exists => Err(Error::type_not_found(type_name)),
                Some(entry) if !entry.other.is_empty() => Err(Error::type_not_registered(
                    type_name,
                    Some(format!(
                        "Service(s) '{}' of this type exist but are not autowired.",
                        entry.other.join("', '")
                    )),
                )),
                _ => Err(Error::type_not_registered(type_name, None)),
            },
            many => Err(Error::ambiguous(type_name, many.to_vec())),
        }
    }
}
