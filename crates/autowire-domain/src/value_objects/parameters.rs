//! Parameters - the compile-time configuration tree
//!
//! Parameters are a nested JSON object addressed with dotted keys
//! (`database.host`). String values may embed placeholders:
//!
//! | Form | Result |
//! |------|--------|
//! | `"%database.port%"` | the referenced value, keeping its JSON type |
//! | `"tcp://%database.host%:%database.port%"` | scalars interpolated into the string |
//! | `"100%%"` | a literal `%` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::value_objects::suggestion;

/// Nested key-value parameter tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    root: Map<String, Value>,
}

impl Parameters {
    /// Create an empty parameter tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter tree from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self::new()),
            other => Err(Error::configuration(format!(
                "Parameters must be a map, {} given",
                json_kind(&other)
            ))),
        }
    }

    /// The whole tree as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Whether no parameter is defined
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up a dotted key
    pub fn get(&self, key: &str) -> Result<&Value> {
        let segments = split_key(key)?;
        let mut current: Option<&Value> = None;

        for (index, segment) in segments.iter().enumerate() {
            let next = match current {
                None => self.root.get(*segment),
                Some(Value::Object(map)) => map.get(*segment),
                Some(Value::Array(items)) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                Some(_) => {
                    return Err(self.not_found(key, Some(segments[..index].join("."))));
                }
            };
            match next {
                Some(value) => current = Some(value),
                None => return Err(self.not_found(key, None)),
            }
        }

        current.ok_or_else(|| self.not_found(key, None))
    }

    /// Whether a dotted key resolves to a value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Set a dotted key, creating intermediate maps as needed
    ///
    /// Fails when an intermediate value exists and is not a map.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let segments = split_key(key)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| Error::configuration("Parameter key cannot be empty"))?;

        let mut current = &mut self.root;
        for (index, segment) in parents.iter().enumerate() {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::configuration(format!(
                        "Cannot set parameter '{key}': value of '{}' is not a map",
                        segments[..=index].join(".")
                    )));
                }
            };
        }
        current.insert((*last).to_string(), value);
        Ok(())
    }

    /// Deep-merge another tree into this one; values from `other` win
    pub fn merge(&mut self, other: &Parameters) {
        merge_maps(&mut self.root, &other.root);
    }

    /// Every dotted key of the tree, leaves and branches alike
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys);
        keys
    }

    /// Expand every placeholder found in `value`
    pub fn expand(&self, value: &Value) -> Result<Value> {
        self.expand_with(value, &mut Vec::new())
    }

    /// Expand placeholders inside the parameters themselves
    pub fn resolved(&self) -> Result<Parameters> {
        match self.expand(&self.to_value())? {
            Value::Object(root) => Ok(Parameters { root }),
            _ => Err(Error::invalid_state("Expanded parameters are not a map")),
        }
    }

    fn expand_with(&self, value: &Value, chain: &mut Vec<String>) -> Result<Value> {
        match value {
            Value::String(text) => self.expand_string(text, chain),
            Value::Array(items) => items
                .iter()
                .map(|item| self.expand_with(item, chain))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut expanded = Map::new();
                for (key, item) in map {
                    expanded.insert(key.clone(), self.expand_with(item, chain)?);
                }
                Ok(Value::Object(expanded))
            }
            other => Ok(other.clone()),
        }
    }

    fn expand_string(&self, text: &str, chain: &mut Vec<String>) -> Result<Value> {
        if let Some(key) = whole_placeholder(text) {
            return self.lookup_expanded(key, chain);
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('%') {
                Some(0) => {
                    out.push('%');
                    rest = &after[1..];
                }
                Some(end) if is_key(&after[..end]) => {
                    let key = &after[..end];
                    match self.lookup_expanded(key, chain)? {
                        Value::String(s) => out.push_str(&s),
                        Value::Number(n) => out.push_str(&n.to_string()),
                        Value::Bool(b) => out.push_str(if b { "1" } else { "" }),
                        Value::Null => {}
                        _ => {
                            return Err(Error::configuration(format!(
                                "Unable to concatenate non-scalar parameter '{key}' into '{text}'"
                            )));
                        }
                    }
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }

    fn lookup_expanded(&self, key: &str, chain: &mut Vec<String>) -> Result<Value> {
        if chain.iter().any(|seen| seen == key) {
            let mut cycle: Vec<String> = chain.iter().map(|k| format!("%{k}%")).collect();
            cycle.push(format!("%{key}%"));
            return Err(Error::configuration(format!(
                "Circular reference detected for parameters: {}",
                cycle.join(", ")
            )));
        }
        let raw = self.get(key)?.clone();
        chain.push(key.to_string());
        let expanded = self.expand_with(&raw, chain);
        chain.pop();
        expanded
    }

    fn not_found(&self, key: &str, nested: Option<String>) -> Error {
        let keys = self.keys();
        Error::ParameterNotFound {
            key: key.to_string(),
            suggestions: suggestion::suggest(keys.iter().map(String::as_str), key),
            nested,
        }
    }
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::configuration(format!(
            "Malformed parameter key '{key}'"
        )));
    }
    Ok(segments)
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('%')?.strip_suffix('%')?;
    is_key(inner).then_some(inner)
}

fn is_key(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn merge_maps(into: &mut Map<String, Value>, from: &Map<String, Value>) {
    for (key, value) in from {
        match (into.get_mut(key), value) {
            (Some(Value::Object(target)), Value::Object(source)) => merge_maps(target, source),
            _ => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in map {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Value::Object(children) = value {
            collect_keys(children, &full, keys);
        }
        keys.push(full);
    }
}

/// Human-readable kind of a JSON value
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
