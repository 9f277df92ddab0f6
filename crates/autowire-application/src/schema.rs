//! Configuration schemas of compiler extensions
//!
//! Each extension describes the shape of its configuration section. The
//! compiler normalises the raw section against it before the extension sees
//! it: defaults are filled in, unknown keys are rejected with a near-miss
//! suggestion, and type mismatches name the offending path.

use std::collections::BTreeMap;

use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::parameters::json_kind;
use autowire_domain::value_objects::suggestion;
use serde_json::{Map, Value};

/// Expected shape of a configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Anything
    Any,
    /// `true` / `false`
    Bool,
    /// An integer
    Int,
    /// Any number
    Float,
    /// A string
    String,
    /// A list whose items follow the inner schema
    List(Box<Schema>),
    /// A map with arbitrary keys whose values follow the inner schema
    Map(Box<Schema>),
    /// A map with a fixed set of keys
    Structure(BTreeMap<String, Field>),
    /// The first alternative that accepts the value
    AnyOf(Vec<Schema>),
    /// `null` or the inner schema
    Nullable(Box<Schema>),
}

/// One key of a [`Schema::Structure`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    schema: Schema,
    required: bool,
    default: Option<Value>,
}

impl Field {
    /// A key that may be omitted
    pub fn optional(schema: Schema) -> Self {
        Self {
            schema,
            required: false,
            default: None,
        }
    }

    /// A key that must be present
    pub fn required(schema: Schema) -> Self {
        Self {
            schema,
            required: true,
            default: None,
        }
    }

    /// Value used when the key is omitted
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl Schema {
    /// A list of `item`
    pub fn list(item: Schema) -> Self {
        Self::List(Box::new(item))
    }

    /// A map of `value`
    pub fn map(value: Schema) -> Self {
        Self::Map(Box::new(value))
    }

    /// `null` or `inner`
    pub fn nullable(inner: Schema) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// A structure built from `(key, field)` pairs
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Field)>,
        K: Into<String>,
    {
        Self::Structure(fields.into_iter().map(|(k, f)| (k.into(), f)).collect())
    }

    /// Validate `value` and fill in defaults
    ///
    /// `path` names the value in error messages (`"search.batch"`).
    pub fn normalize(&self, value: &Value, path: &str) -> Result<Value> {
        match (self, value) {
            (Self::Any, _) => Ok(value.clone()),
            (Self::Bool, Value::Bool(_)) | (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            (Self::Float, Value::Number(_)) => Ok(value.clone()),
            (Self::Nullable(_), Value::Null) => Ok(Value::Null),
            (Self::Nullable(inner), _) => inner.normalize(value, path),
            (Self::List(_), Value::Null) => Ok(Value::Array(Vec::new())),
            (Self::List(item), Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, v)| item.normalize(v, &join(path, &index.to_string())))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (Self::Map(_), Value::Null) => Ok(Value::Object(Map::new())),
            (Self::Map(inner), Value::Object(map)) => {
                let mut out = Map::new();
                for (key, v) in map {
                    out.insert(key.clone(), inner.normalize(v, &join(path, key))?);
                }
                Ok(Value::Object(out))
            }
            (Self::Structure(fields), Value::Null) => normalize_structure(fields, &Map::new(), path),
            (Self::Structure(fields), Value::Object(map)) => normalize_structure(fields, map, path),
            (Self::AnyOf(options), _) => options
                .iter()
                .find_map(|option| option.normalize(value, path).ok())
                .ok_or_else(|| mismatch(path, &self.describe(), value)),
            _ => Err(mismatch(path, &self.describe(), value)),
        }
    }

    /// Human-readable name of the expected shape
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "anything".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::String => "string".to_string(),
            Self::List(item) => format!("list of {}", item.describe()),
            Self::Map(inner) => format!("map of {}", inner.describe()),
            Self::Structure(_) => "structure".to_string(),
            Self::AnyOf(options) => options
                .iter()
                .map(Schema::describe)
                .collect::<Vec<_>>()
                .join(" or "),
            Self::Nullable(inner) => format!("{} or null", inner.describe()),
        }
    }
}

fn normalize_structure(fields: &BTreeMap<String, Field>, map: &Map<String, Value>, path: &str) -> Result<Value> {
    if let Some(unknown) = map.keys().find(|key| !fields.contains_key(*key)) {
        let hint = suggestion::hint(fields.keys().map(String::as_str), unknown);
        return Err(Error::configuration(format!(
            "Unexpected item '{}'.{}",
            join(path, unknown),
            hint.map(|h| format!(" {h}")).unwrap_or_default()
        )));
    }

    let mut out = Map::new();
    for (key, field) in fields {
        match map.get(key) {
            Some(value) => {
                out.insert(key.clone(), field.schema.normalize(value, &join(path, key))?);
            }
            None if field.required => {
                return Err(Error::configuration(format!(
                    "The mandatory item '{}' is missing.",
                    join(path, key)
                )));
            }
            None => {
                if let Some(default) = &field.default {
                    out.insert(key.clone(), default.clone());
                }
            }
        }
    }
    Ok(Value::Object(out))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> Error {
    Error::configuration(format!(
        "The item '{path}' expects to be {expected}, {} given.",
        json_kind(actual)
    ))
}
