//! Bootstrap - from configuration files to a running container
//!
//! ```text
//! TOML files + env ──► ConfigLoader ──► sections ──┐
//! programmatic config ─────────────────────────────┤
//!                                                   ▼
//!                           fingerprint ──► ArtifactCache ── hit ──► plan
//!                                                   │ miss
//!                                                   ▼
//!                     ContainerBuilder + extensions ──► Compiler ──► plan
//!                                                                     │
//!                                     Container::new ──► initialize ◄─┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let container = Bootstrap::new(catalog)
//!     .with_default_extensions()?
//!     .add_config_file("config/app.toml")
//!     .set_cache_dir("var/cache")
//!     .create_container()?;
//!
//! let app = container.get_by_type_as::<App>("App")?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use autowire_application::compiler::{PARAMETERS_SECTION, merge_config};
use autowire_application::generator::GeneratedContainer;
use autowire_application::{
    Compiler, ContainerBuilder, DiExtension, Extension, SearchExtension, ServicesExtension,
};
use autowire_domain::TypeCatalog;
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::parameters::json_kind;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::cache::{ArtifactCache, Fingerprint};
use crate::config::{ConfigLoader, ContainerConfig};
use crate::container::Container;
use crate::logging::init_logging;

/// Name of the built-in `services` extension
pub const SERVICES_EXTENSION: &str = "services";

/// Name of the built-in `search` extension
pub const SEARCH_EXTENSION: &str = "search";

/// Name of the built-in `di` extension
pub const DI_EXTENSION: &str = "di";

/// Configurator collecting everything a container is compiled from
pub struct Bootstrap {
    catalog: Arc<TypeCatalog>,
    loader: ConfigLoader,
    extensions: Vec<(String, Box<dyn Extension>)>,
    parameters: Map<String, Value>,
    config: Map<String, Value>,
    class_name: Option<String>,
    cache_dir: Option<PathBuf>,
    debug: Option<bool>,
    lock_file: Option<PathBuf>,
    logging: bool,
}

impl Bootstrap {
    /// Start from a type catalog
    pub fn new(catalog: impl Into<Arc<TypeCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            loader: ConfigLoader::new(),
            extensions: Vec::new(),
            parameters: Map::new(),
            config: Map::new(),
            class_name: None,
            cache_dir: None,
            debug: None,
            lock_file: None,
            logging: false,
        }
    }

    /// Register the `services`, `search` and `di` extensions
    pub fn with_default_extensions(self) -> Result<Self> {
        self.add_extension(SERVICES_EXTENSION, ServicesExtension::new())?
            .add_extension(SEARCH_EXTENSION, SearchExtension::new())?
            .add_extension(DI_EXTENSION, DiExtension::new())
    }

    /// Register an extension owning the configuration section `name`
    pub fn add_extension<E>(mut self, name: impl Into<String>, extension: E) -> Result<Self>
    where
        E: Extension + 'static,
    {
        let name = name.into();
        if self.extensions.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::configuration(format!(
                "Name '{name}' is already used by another extension."
            )));
        }
        self.extensions.push((name, Box::new(extension)));
        Ok(self)
    }

    /// Add a TOML configuration file; later files win
    #[must_use]
    pub fn add_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.loader = self.loader.with_config_path(path.into());
        self
    }

    /// Deep-merge configuration sections over the files
    pub fn add_config(mut self, config: Value) -> Result<Self> {
        merge_config(&mut self.config, sections(config)?);
        Ok(self)
    }

    /// Add parameters; configuration files can override them
    pub fn add_parameters(mut self, parameters: Value) -> Result<Self> {
        merge_config(&mut self.parameters, sections(parameters)?);
        Ok(self)
    }

    /// Name of the generated container, overriding the configuration
    #[must_use]
    pub fn set_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Cache directory for compiled artifacts, overriding the configuration
    #[must_use]
    pub fn set_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Debug mode, overriding the configuration
    #[must_use]
    pub fn set_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Dependency lock file whose contents invalidate cached artifacts
    #[must_use]
    pub fn set_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file = Some(path.into());
        self
    }

    /// Use a custom configuration loader (prefix, environment)
    #[must_use]
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        let files = self.loader.config_paths().to_vec();
        self.loader = files
            .into_iter()
            .fold(loader, ConfigLoader::with_config_path);
        self
    }

    /// Install the tracing subscriber from the `container.logging` settings
    #[must_use]
    pub fn enable_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Compile (or load) the container plan without booting it
    pub fn compile(self) -> Result<GeneratedContainer> {
        self.prepare()?.compile()
    }

    /// Compile (or load) the container, boot it and run its initializers
    pub fn create_container(self) -> Result<Container> {
        let prepared = self.prepare()?;
        let catalog = Arc::clone(&prepared.catalog);
        let container = Container::new(prepared.compile()?, catalog)?;
        container.initialize()?;
        info!(class = %container.class_name(), "Container ready");
        Ok(container)
    }

    fn prepare(self) -> Result<Prepared> {
        let loaded = self.loader.load()?;
        let mut settings = loaded.container;
        if let Some(class_name) = self.class_name {
            settings.class_name = class_name;
        }
        if let Some(cache_dir) = self.cache_dir {
            settings.cache_dir = Some(cache_dir);
        }
        if let Some(debug) = self.debug {
            settings.debug = debug;
        }
        if self.logging {
            init_logging(&settings.logging)?;
        }

        let mut config = Map::new();
        config.insert(PARAMETERS_SECTION.to_string(), Value::Object(self.parameters));
        if self.extensions.iter().any(|(name, _)| name == DI_EXTENSION) {
            config.insert(DI_EXTENSION.to_string(), json!({ "debug": settings.debug }));
        }
        merge_config(&mut config, loaded.sections);
        merge_config(&mut config, self.config);
        let config = Value::Object(config);

        let fingerprint = Fingerprint::new()
            .class_name(&settings.class_name)
            .config(&config)?
            .files(self.loader.config_paths())
            .extensions(self.extensions.iter().map(|(name, _)| name.as_str()))
            .catalog(&self.catalog)?
            .lock_file(self.lock_file.as_deref())?
            .finish();

        Ok(Prepared {
            catalog: self.catalog,
            extensions: self.extensions,
            config,
            settings,
            fingerprint,
        })
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("files", &self.loader.config_paths())
            .field(
                "extensions",
                &self.extensions.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

/// Inputs gathered, fingerprint computed
struct Prepared {
    catalog: Arc<TypeCatalog>,
    extensions: Vec<(String, Box<dyn Extension>)>,
    config: Value,
    settings: ContainerConfig,
    fingerprint: String,
}

impl Prepared {
    fn compile(self) -> Result<GeneratedContainer> {
        let Self {
            catalog,
            extensions,
            config,
            settings,
            fingerprint,
        } = self;

        let class_name = settings.class_name.clone();
        let run = move || {
            let mut compiler = Compiler::new(ContainerBuilder::new(catalog));
            compiler.set_class_name(class_name);
            for (name, extension) in extensions {
                compiler.add_boxed_extension(name, extension)?;
            }
            compiler.add_config(config)?;
            compiler.compile()
        };

        match &settings.cache_dir {
            Some(dir) => ArtifactCache::new(dir).load_or_compile(
                &settings.class_name,
                &fingerprint,
                settings.debug,
                run,
            ),
            None => run(),
        }
    }
}

fn sections(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::configuration(format!(
            "Configuration must be a map, {} given",
            json_kind(&other)
        ))),
    }
}
