//! Compiler - drives extensions over the builder and generates the container
//!
//! ```text
//! ┌─────────────┐  sections   ┌──────────────────┐
//! │ config map  │ ──────────► │ schema normalise │  unknown section → error
//! └─────────────┘             └────────┬─────────┘
//!                                      ▼
//!          load_configuration (all) → before_compile (all)
//!                                      ▼
//!                freeze → generate → after_compile (all)
//! ```
//!
//! The `parameters` section is reserved: it is merged into the builder's
//! parameters before any extension runs. Any error aborts compilation; no
//! partial container is produced.

use std::collections::BTreeMap;

use autowire_domain::constants::DEFAULT_CONTAINER_CLASS;
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::suggestion;
use autowire_domain::Parameters;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::builder::ContainerBuilder;
use crate::extension::{ClassSkeleton, CompilerContext, Extension};
use crate::generator::{CodeGenerator, GeneratedContainer};

/// Name of the configuration section holding parameters
pub const PARAMETERS_SECTION: &str = "parameters";

static NULL: Value = Value::Null;

/// Runs the compiler passes
pub struct Compiler {
    builder: ContainerBuilder,
    extensions: Vec<(String, Box<dyn Extension>)>,
    config: Map<String, Value>,
    class_name: String,
}

impl Compiler {
    /// Create a compiler over a builder
    pub fn new(builder: ContainerBuilder) -> Self {
        Self {
            builder,
            extensions: Vec::new(),
            config: Map::new(),
            class_name: DEFAULT_CONTAINER_CLASS.to_string(),
        }
    }

    /// Register an extension owning the configuration section `name`
    pub fn add_extension<E>(&mut self, name: impl Into<String>, extension: E) -> Result<&mut Self>
    where
        E: Extension + 'static,
    {
        self.add_boxed_extension(name, Box::new(extension))
    }

    /// Register an already boxed extension
    pub fn add_boxed_extension(
        &mut self,
        name: impl Into<String>,
        extension: Box<dyn Extension>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if name == PARAMETERS_SECTION {
            return Err(Error::configuration(format!(
                "Name '{PARAMETERS_SECTION}' is reserved and cannot be used for an extension."
            )));
        }
        if self.extensions.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::configuration(format!(
                "Name '{name}' is already used by another extension."
            )));
        }
        debug!(extension = %name, "Extension registered");
        self.extensions.push((name, extension));
        Ok(self)
    }

    /// Deep-merge a configuration map (section name to section)
    pub fn add_config(&mut self, config: Value) -> Result<&mut Self> {
        match config {
            Value::Null => {}
            Value::Object(sections) => merge_config(&mut self.config, sections),
            other => {
                return Err(Error::configuration(format!(
                    "Configuration must be a map of sections, {} given",
                    autowire_domain::value_objects::parameters::json_kind(&other)
                )));
            }
        }
        Ok(self)
    }

    /// Name the generated container
    pub fn set_class_name(&mut self, class_name: impl Into<String>) -> &mut Self {
        self.class_name = class_name.into();
        self
    }

    /// Name of the generated container
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The builder
    pub fn builder(&self) -> &ContainerBuilder {
        &self.builder
    }

    /// The builder, for programmatic definitions
    pub fn builder_mut(&mut self) -> &mut ContainerBuilder {
        &mut self.builder
    }

    /// Extension names in registration order
    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The merged raw configuration
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// Run every phase and generate the container
    pub fn compile(mut self) -> Result<GeneratedContainer> {
        info!(
            class = %self.class_name,
            extensions = self.extensions.len(),
            "Compiling container"
        );

        if let Some(parameters) = self.config.remove(PARAMETERS_SECTION) {
            self.builder.add_parameters(&Parameters::from_value(parameters)?);
        }

        let configs = self.normalize_sections()?;

        for (name, extension) in &mut self.extensions {
            debug!(extension = %name, "Loading configuration");
            let mut context = CompilerContext::new(name, &mut self.builder, &configs);
            extension
                .load_configuration(&mut context)
                .map_err(|error| error.in_context(format!("Extension '{name}'")))?;
        }

        for (name, extension) in &mut self.extensions {
            debug!(extension = %name, "Before compile");
            let mut context = CompilerContext::new(name, &mut self.builder, &configs);
            extension
                .before_compile(&mut context)
                .map_err(|error| error.in_context(format!("Extension '{name}'")))?;
        }

        let registry = self.builder.freeze()?;
        let mut container = CodeGenerator::new(self.class_name.as_str()).generate(&registry)?;

        for (name, extension) in &mut self.extensions {
            debug!(extension = %name, "After compile");
            let config = configs.get(name.as_str()).unwrap_or(&NULL);
            let mut skeleton = ClassSkeleton::new(name, &mut container, config);
            extension
                .after_compile(&mut skeleton)
                .map_err(|error| error.in_context(format!("Extension '{name}'")))?;
        }

        info!(
            class = %container.class_name,
            services = container.methods.len(),
            "Container compiled"
        );
        Ok(container)
    }

    fn normalize_sections(&self) -> Result<BTreeMap<String, Value>> {
        let names: Vec<&str> = self.extension_names();
        if let Some(unknown) = self.config.keys().find(|section| !names.contains(&section.as_str())) {
            let hint = suggestion::hint(names.iter().copied(), unknown);
            return Err(Error::configuration(format!(
                "Found section '{unknown}' in configuration, but corresponding extension is missing.{}",
                hint.map(|h| format!(" {h}")).unwrap_or_default()
            )));
        }

        let mut configs = BTreeMap::new();
        for (name, extension) in &self.extensions {
            let raw = self.config.get(name).unwrap_or(&NULL);
            let normalized = extension
                .config_schema()
                .normalize(raw, name)
                .map_err(|error| error.in_context(format!("Extension '{name}'")))?;
            configs.insert(name.clone(), normalized);
        }
        Ok(configs)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("class_name", &self.class_name)
            .field("extensions", &self.extension_names())
            .field("builder", &self.builder)
            .finish()
    }
}

/// Deep-merge `from` into `into`; maps merge recursively, anything else is replaced
pub fn merge_config(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        match (into.get_mut(&key), value) {
            (Some(Value::Object(target)), Value::Object(source)) => merge_config(target, source),
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}
