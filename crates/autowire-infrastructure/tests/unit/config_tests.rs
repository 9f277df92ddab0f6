//! Tests for the configuration loader

use std::fs;
use std::path::PathBuf;

use autowire_infrastructure::config::{ConfigLoader, ContainerConfig};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn test_defaults_without_files() {
    let loaded = ConfigLoader::new().without_env().load().expect("load");
    assert_eq!(loaded.container, ContainerConfig::default());
    assert_eq!(loaded.container.class_name, "GeneratedContainer");
    assert!(loaded.sections.is_empty());
}

#[test]
fn test_file_sections_and_container_settings() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "app.toml",
        r#"
[container]
class_name = "AppContainer"
debug = true

[container.logging]
level = "debug"

[parameters.mail]
host = "smtp.local"

[services]
logger = "Logger"
"#,
    );

    let loaded = ConfigLoader::new().without_env().with_config_path(&path).load().expect("load");
    assert_eq!(loaded.container.class_name, "AppContainer");
    assert!(loaded.container.debug);
    assert_eq!(loaded.container.logging.level, "debug");
    assert_eq!(
        loaded.sections_value(),
        json!({
            "parameters": { "mail": { "host": "smtp.local" } },
            "services": { "logger": "Logger" }
        })
    );
}

#[test]
fn test_later_file_wins() {
    let dir = TempDir::new().expect("temp dir");
    let base = write(&dir, "base.toml", "[parameters]\nhost = \"base\"\nport = 25\n");
    let local = write(&dir, "local.toml", "[parameters]\nhost = \"local\"\n");

    let loaded = ConfigLoader::new()
        .without_env()
        .with_config_path(&base)
        .with_config_path(&local)
        .load()
        .expect("load");
    assert_eq!(loaded.sections["parameters"], json!({ "host": "local", "port": 25 }));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("missing.toml");

    let error = ConfigLoader::new()
        .without_env()
        .with_config_path(&missing)
        .load()
        .err()
        .expect("missing");
    assert!(error.to_string().contains("not found"), "{error}");
}

#[test]
fn test_invalid_class_name_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "app.toml", "[container]\nclass_name = \"My Container\"\n");

    let error = ConfigLoader::new()
        .without_env()
        .with_config_path(&path)
        .load()
        .err()
        .expect("invalid");
    assert_eq!(
        error.to_string(),
        "Configuration error: Container class name 'My Container' must be a non-empty identifier"
    );
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "app.toml", "[container.logging]\nlevel = \"loud\"\n");

    let error = ConfigLoader::new()
        .without_env()
        .with_config_path(&path)
        .load()
        .err()
        .expect("invalid");
    assert!(error.to_string().contains("Invalid log level: loud"), "{error}");
}

#[test]
fn test_config_paths_keep_order() {
    let loader = ConfigLoader::new().with_config_path("a.toml").with_config_path("b.toml");
    assert_eq!(
        loader.config_paths(),
        &[PathBuf::from("a.toml"), PathBuf::from("b.toml")]
    );
}
