//! `di` extension - container-level options
//!
//! Services tagged `run` (with any attribute other than `false`) and the
//! services listed under `eager` are created as soon as the container
//! boots, in natural name order.
//!
//! `debug` is published as the `debug` parameter unless the configuration
//! already defines one.

use autowire_domain::constants::RUN_TAG;
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::natural;
use serde_json::{Value, json};
use tracing::debug;

use crate::extension::{ClassSkeleton, CompilerContext, Extension};
use crate::generator::Expr;
use crate::schema::{Field, Schema};

/// Eager service creation
#[derive(Debug, Default)]
pub struct DiExtension {
    eager: Vec<String>,
}

impl DiExtension {
    /// Create the extension
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for DiExtension {
    fn config_schema(&self) -> Schema {
        Schema::structure([
            (
                "eager",
                Field::optional(Schema::list(Schema::String)).default(json!([])),
            ),
            ("debug", Field::optional(Schema::Bool).default(json!(false))),
        ])
    }

    fn load_configuration(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        let debug = context.config().get("debug").cloned().unwrap_or(Value::Bool(false));
        if !context.builder().parameters().has("debug") {
            context.builder_mut().set_parameter("debug", debug)?;
        }
        Ok(())
    }

    fn before_compile(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        let builder = context.builder();
        let mut eager: Vec<String> = builder
            .find_by_tag(RUN_TAG)
            .into_iter()
            .filter(|(_, attributes)| *attributes != Value::Bool(false))
            .map(|(name, _)| name)
            .collect();

        let listed = context
            .config()
            .get("eager")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for name in listed.iter().filter_map(Value::as_str) {
            if !builder.has_definition(name) {
                return Err(Error::service_not_found(name).in_context("Eager service"));
            }
            eager.push(builder.resolve_alias(name).to_string());
        }

        natural::sort(&mut eager);
        eager.dedup();
        debug!(services = ?eager, "Eager services");
        self.eager = eager;
        Ok(())
    }

    fn after_compile(&mut self, skeleton: &mut ClassSkeleton<'_>) -> Result<()> {
        for name in &self.eager {
            skeleton.add_initializer(Expr::service(name.as_str()));
        }
        Ok(())
    }
}
