//! `search` extension - registers catalog classes matching masks
//!
//! ```text
//! search:
//!   repositories:
//!     classes: [ "*Repository" ]
//!     exclude: [ "Legacy*" ]
//!     tags: [ repository ]
//!   handlers:
//!     implements: [ Handler ]
//! ```
//!
//! Every instantiable class with a constructor that matches one of the
//! masks and implements every listed type becomes a service named
//! `search.<batch>.<class>`. Classes that already have a service are left
//! alone.

use std::sync::Arc;

use autowire_domain::error::{Error, Result};
use autowire_domain::Statement;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::extension::{CompilerContext, Extension};
use crate::schema::{Field, Schema};

#[derive(Debug, Deserialize)]
struct Batch {
    classes: Vec<String>,
    implements: Vec<String>,
    exclude: Vec<String>,
    tags: Vec<String>,
}

/// Registers services found in the type catalog
#[derive(Debug, Default)]
pub struct SearchExtension;

impl SearchExtension {
    /// Create the extension
    pub fn new() -> Self {
        Self
    }
}

impl Extension for SearchExtension {
    fn config_schema(&self) -> Schema {
        let strings = || Field::optional(Schema::list(Schema::String)).default(json!([]));
        Schema::map(Schema::structure([
            ("classes", strings()),
            ("implements", strings()),
            ("exclude", strings()),
            ("tags", strings()),
        ]))
    }

    fn load_configuration(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        let batches: Vec<(String, Batch)> = match context.config() {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| Ok((name.clone(), serde_json::from_value(value.clone())?)))
                .collect::<Result<_>>()?,
            _ => Vec::new(),
        };
        let catalog = Arc::clone(context.builder().catalog());

        for (batch_name, batch) in batches {
            if batch.classes.is_empty() && batch.implements.is_empty() {
                return Err(Error::configuration(format!(
                    "Batch '{batch_name}' needs 'classes' or 'implements'."
                )));
            }

            let found: Vec<String> = catalog
                .type_names()
                .filter(|class| {
                    catalog
                        .get(class)
                        .is_some_and(|info| info.is_instantiable() && info.constructor_fn().is_some())
                })
                .filter(|class| batch.classes.is_empty() || batch.classes.iter().any(|m| matches_mask(m, class)))
                .filter(|class| batch.implements.iter().all(|t| catalog.is_a(class, t)))
                .filter(|class| !batch.exclude.iter().any(|m| matches_mask(m, class)))
                .map(str::to_string)
                .collect();

            for class in found {
                if !context.builder().find_by_type(&class).is_empty() {
                    debug!(class = %class, "Already registered, skipping");
                    continue;
                }
                let name = context.prefix(&format!("{batch_name}.{class}"));
                debug!(service = %name, class = %class, "Registering found class");
                let definition = context.builder_mut().register(name, Statement::class(class.as_str()));
                definition.set_type(class.as_str());
                for tag in &batch.tags {
                    definition.add_tag(tag.as_str(), true);
                }
            }
        }
        Ok(())
    }
}

/// Whether `name` matches a mask where `*` stands for any run of characters
pub fn matches_mask(mask: &str, name: &str) -> bool {
    let mask: Vec<char> = mask.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut m, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if m < mask.len() && mask[m] == '*' {
            backtrack = Some((m, n));
            m += 1;
        } else if m < mask.len() && mask[m] == name[n] {
            m += 1;
            n += 1;
        } else if let Some((star, matched)) = backtrack {
            m = star + 1;
            n = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    mask[m..].iter().all(|c| *c == '*')
}
