//! Compiled artifact cache
//!
//! ```text
//! <cache_dir>/
//! ├── GeneratedContainer_3f9a1c0d2b7e4a55.json   plan loaded at boot
//! └── GeneratedContainer_3f9a1c0d2b7e4a55.rs     rendered source, for reading
//! ```
//!
//! The file name carries a fingerprint of every compilation input. Any
//! change to the configuration, the file list, the registered extensions,
//! the catalog or the lock file yields a new name, so a stale artifact is
//! never loaded. Files are written next to their final name and renamed
//! into place.

use std::fs;
use std::path::{Path, PathBuf};

use autowire_application::generator::{GeneratedContainer, render};
use autowire_domain::TypeCatalog;
use autowire_domain::error::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::constants::{FINGERPRINT_LENGTH, PLAN_EXTENSION, SOURCE_EXTENSION, TEMP_SUFFIX};
use crate::error_ext::ErrorContext;

// ============================================================================
// Fingerprint
// ============================================================================

/// Hash of the compilation inputs
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Start an empty fingerprint
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one labelled input
    fn feed(&mut self, label: &str, bytes: &[u8]) {
        self.hasher.update(label.as_bytes());
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Container class name
    #[must_use]
    pub fn class_name(mut self, class_name: &str) -> Self {
        self.feed("class", class_name.as_bytes());
        self
    }

    /// Merged configuration
    pub fn config(mut self, config: &Value) -> Result<Self> {
        let canonical = serde_json::to_vec(config)?;
        self.feed("config", &canonical);
        Ok(self)
    }

    /// Configuration file list, in merge order
    #[must_use]
    pub fn files(mut self, files: &[PathBuf]) -> Self {
        for file in files {
            self.feed("file", file.to_string_lossy().as_bytes());
        }
        self
    }

    /// Registered extension names, in registration order
    #[must_use]
    pub fn extensions<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.feed("extension", name.as_bytes());
        }
        self
    }

    /// Declared types and functions of the catalog, with their hierarchy
    /// and signatures
    pub fn catalog(mut self, catalog: &TypeCatalog) -> Result<Self> {
        let canonical = serde_json::to_vec(&catalog.signature())?;
        self.feed("catalog", &canonical);
        Ok(self)
    }

    /// Contents of a dependency lock file, when one exists
    pub fn lock_file(mut self, path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path.filter(|p| p.exists()) {
            let contents =
                fs::read(path).io_context(format!("Failed to read lock file {}", path.display()))?;
            self.feed("lock", &contents);
        }
        Ok(self)
    }

    /// Shortened hex digest
    pub fn finish(self) -> String {
        let mut digest = hex::encode(self.hasher.finalize());
        digest.truncate(FINGERPRINT_LENGTH);
        digest
    }
}

// ============================================================================
// Artifact cache
// ============================================================================

/// Directory of compiled containers
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    /// Use `dir`, created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the serialized plan
    pub fn plan_path(&self, class_name: &str, fingerprint: &str) -> PathBuf {
        self.dir
            .join(format!("{class_name}_{fingerprint}.{PLAN_EXTENSION}"))
    }

    /// Path of the rendered source
    pub fn source_path(&self, class_name: &str, fingerprint: &str) -> PathBuf {
        self.dir
            .join(format!("{class_name}_{fingerprint}.{SOURCE_EXTENSION}"))
    }

    /// Load a cached plan
    ///
    /// A missing or unreadable artifact is a miss, not an error.
    pub fn load(&self, class_name: &str, fingerprint: &str) -> Option<GeneratedContainer> {
        let path = self.plan_path(class_name, fingerprint);
        let text = fs::read_to_string(&path).ok()?;
        match GeneratedContainer::from_json(&text) {
            Ok(container) if container.class_name == class_name => Some(container),
            Ok(container) => {
                warn!(
                    path = %path.display(),
                    found = %container.class_name,
                    "Cached artifact belongs to another container, ignoring"
                );
                None
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Corrupt cached artifact, ignoring");
                None
            }
        }
    }

    /// Write the plan and its rendered source
    pub fn store(&self, container: &GeneratedContainer, fingerprint: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .io_context(format!("Failed to create cache directory {}", self.dir.display()))?;

        let source = render(container)?;
        write_atomic(&self.source_path(&container.class_name, fingerprint), &source)?;

        let plan = self.plan_path(&container.class_name, fingerprint);
        write_atomic(&plan, &container.to_json()?)?;
        debug!(path = %plan.display(), "Artifact written");
        Ok(plan)
    }

    /// Reuse the artifact for `fingerprint`, or compile and store a new one
    ///
    /// With `rebuild` the cached artifact is ignored and overwritten.
    pub fn load_or_compile<F>(
        &self,
        class_name: &str,
        fingerprint: &str,
        rebuild: bool,
        compile: F,
    ) -> Result<GeneratedContainer>
    where
        F: FnOnce() -> Result<GeneratedContainer>,
    {
        if !rebuild
            && let Some(container) = self.load(class_name, fingerprint)
        {
            info!(class = class_name, fingerprint, "Container loaded from cache");
            return Ok(container);
        }

        info!(class = class_name, fingerprint, rebuild, "Cache miss, compiling container");
        let container = compile()?;
        self.store(&container, fingerprint)?;
        Ok(container)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(format!(".{}.{TEMP_SUFFIX}", std::process::id()));
    let temp = PathBuf::from(temp);

    fs::write(&temp, contents).io_context(format!("Failed to write {}", temp.display()))?;
    fs::rename(&temp, path).io_context(format!("Failed to move artifact to {}", path.display()))
}
