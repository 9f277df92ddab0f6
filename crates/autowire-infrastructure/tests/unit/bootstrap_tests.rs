//! Tests for bootstrapping a container from configuration

use std::fs;
use std::path::Path;

use autowire_infrastructure::{Bootstrap, ConfigLoader};
use serde_json::json;
use tempfile::TempDir;

use crate::fixtures::{App, Mailer, catalog};

const APP_TOML: &str = r#"
[parameters.mail]
host = "smtp.local"

[services]
logger = "Logger"
app = "App"

[services.mailer]
factory = "Mailer"
arguments = { host = "%mail.host%" }
setup = ["set_logger"]
"#;

fn bootstrap() -> Bootstrap {
    Bootstrap::new(catalog())
        .with_loader(ConfigLoader::new().without_env())
        .with_default_extensions()
        .expect("extensions")
}

fn artifacts(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn test_container_from_toml() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("app.toml");
    fs::write(&path, APP_TOML).expect("write");

    let container = bootstrap().add_config_file(&path).create_container().expect("container");

    let mailer = container.get_as::<Mailer>("mailer").expect("mailer");
    assert_eq!(mailer.host, "smtp.local");
    assert!(mailer.logger.is_some());
    assert_eq!(container.get_by_type_as::<App>("App").expect("app").logger.line("hi"), "[app] hi");
}

#[test]
fn test_programmatic_config_overrides_files() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("app.toml");
    fs::write(&path, APP_TOML).expect("write");

    let container = bootstrap()
        .add_config_file(&path)
        .add_config(json!({ "parameters": { "mail": { "host": "mail.internal" } } }))
        .expect("config")
        .create_container()
        .expect("container");
    assert_eq!(container.get_as::<Mailer>("mailer").expect("mailer").host, "mail.internal");
}

#[test]
fn test_artifacts_are_reused_until_inputs_change() {
    let dir = TempDir::new().expect("temp dir");
    let cache = dir.path().join("cache");
    let config = json!({ "services": { "logger": "Logger" } });

    let first = bootstrap()
        .set_cache_dir(&cache)
        .add_config(config.clone())
        .expect("config")
        .compile()
        .expect("compile");
    assert_eq!(artifacts(&cache), 2);

    let second = bootstrap()
        .set_cache_dir(&cache)
        .add_config(config.clone())
        .expect("config")
        .compile()
        .expect("compile");
    assert_eq!(artifacts(&cache), 2);
    assert_eq!(first, second);

    bootstrap()
        .set_cache_dir(&cache)
        .add_config(config)
        .expect("config")
        .add_parameters(json!({ "region": "eu" }))
        .expect("parameters")
        .compile()
        .expect("compile");
    assert_eq!(artifacts(&cache), 4);
}

#[test]
fn test_debug_flag_becomes_a_parameter() {
    let container = bootstrap()
        .set_debug(true)
        .add_config(json!({ "services": { "logger": "Logger" } }))
        .expect("config")
        .create_container()
        .expect("container");
    assert_eq!(container.parameter("debug").ok(), Some(json!(true)));
}

#[test]
fn test_class_name_override() {
    let plan = bootstrap()
        .set_class_name("AppContainer")
        .compile()
        .expect("compile");
    assert_eq!(plan.class_name, "AppContainer");
}

#[test]
fn test_duplicate_extension_is_rejected() {
    let error = bootstrap()
        .add_extension("di", autowire_application::DiExtension::new())
        .err()
        .expect("duplicate");
    assert_eq!(
        error.to_string(),
        "Configuration error: Name 'di' is already used by another extension."
    );
}

#[test]
fn test_unknown_section_fails_compilation() {
    let error = bootstrap()
        .add_config(json!({ "servces": { "logger": "Logger" } }))
        .expect("config")
        .compile()
        .err()
        .expect("unknown section");
    assert!(error.to_string().contains("'services'"), "{error}");
}
