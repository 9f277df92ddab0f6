//! Tests for the compiled artifact cache

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use autowire_domain::{ClassInfo, Parameter, TypeCatalog};
use autowire_infrastructure::{ArtifactCache, Bootstrap, ConfigLoader, Fingerprint};
use serde_json::json;
use tempfile::TempDir;

use crate::fixtures::{Log, Logger, app_config, catalog, compile};

fn fingerprint(config: &serde_json::Value) -> String {
    Fingerprint::new()
        .class_name("GeneratedContainer")
        .config(config)
        .expect("config")
        .extensions(["services", "di"])
        .catalog(&catalog())
        .expect("catalog")
        .finish()
}

#[test]
fn test_fingerprint_is_stable_for_same_inputs() {
    let first = fingerprint(&app_config());
    let second = fingerprint(&app_config());
    assert_eq!(first, second);
    assert_eq!(first.len(), 16);
}

#[test]
fn test_fingerprint_follows_every_input() {
    let base = fingerprint(&app_config());
    assert_ne!(base, fingerprint(&json!({ "services": { "logger": "Logger" } })));

    let renamed = Fingerprint::new()
        .class_name("OtherContainer")
        .config(&app_config())
        .expect("config")
        .extensions(["services", "di"])
        .catalog(&catalog())
        .expect("catalog")
        .finish();
    assert_ne!(base, renamed);

    let with_file = Fingerprint::new()
        .class_name("GeneratedContainer")
        .config(&app_config())
        .expect("config")
        .files(&[PathBuf::from("app.toml")])
        .extensions(["services", "di"])
        .catalog(&catalog())
        .expect("catalog")
        .finish();
    assert_ne!(base, with_file);
}

#[test]
fn test_lock_file_contents_change_the_fingerprint() {
    let dir = TempDir::new().expect("temp dir");
    let lock = dir.path().join("Cargo.lock");

    let missing = Fingerprint::new().lock_file(Some(&lock)).expect("lock").finish();
    assert_eq!(missing, Fingerprint::new().finish());

    fs::write(&lock, "version = 1").expect("write");
    let first = Fingerprint::new().lock_file(Some(&lock)).expect("lock").finish();
    fs::write(&lock, "version = 2").expect("write");
    let second = Fingerprint::new().lock_file(Some(&lock)).expect("lock").finish();

    assert_ne!(first, missing);
    assert_ne!(first, second);
}

#[test]
fn test_store_then_load() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ArtifactCache::new(dir.path().join("cache"));
    let plan = compile(&Arc::new(catalog()), app_config());

    let path = cache.store(&plan, "0123456789abcdef").expect("store");
    assert_eq!(path, cache.plan_path("GeneratedContainer", "0123456789abcdef"));
    assert!(cache.source_path("GeneratedContainer", "0123456789abcdef").exists());

    let loaded = cache.load("GeneratedContainer", "0123456789abcdef").expect("hit");
    assert_eq!(loaded, plan);
    assert!(cache.load("GeneratedContainer", "fedcba9876543210").is_none());
}

#[test]
fn test_hit_skips_compilation() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ArtifactCache::new(dir.path());
    let catalog = Arc::new(catalog());
    let compiled = Cell::new(0);

    for _ in 0..2 {
        cache
            .load_or_compile("GeneratedContainer", "aaaaaaaaaaaaaaaa", false, || {
                compiled.set(compiled.get() + 1);
                Ok(compile(&catalog, app_config()))
            })
            .expect("container");
    }
    assert_eq!(compiled.get(), 1);

    cache
        .load_or_compile("GeneratedContainer", "aaaaaaaaaaaaaaaa", true, || {
            compiled.set(compiled.get() + 1);
            Ok(compile(&catalog, app_config()))
        })
        .expect("container");
    assert_eq!(compiled.get(), 2);
}

#[test]
fn test_corrupt_artifact_is_a_miss() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ArtifactCache::new(dir.path());
    fs::write(cache.plan_path("GeneratedContainer", "bbbbbbbbbbbbbbbb"), "{ not json").expect("write");

    assert!(cache.load("GeneratedContainer", "bbbbbbbbbbbbbbbb").is_none());

    let catalog = Arc::new(catalog());
    let container = cache
        .load_or_compile("GeneratedContainer", "bbbbbbbbbbbbbbbb", false, || {
            Ok(compile(&catalog, app_config()))
        })
        .expect("container");
    assert_eq!(
        cache.load("GeneratedContainer", "bbbbbbbbbbbbbbbb"),
        Some(container)
    );
}

#[test]
fn test_compile_failure_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ArtifactCache::new(dir.path().join("cache"));

    let result = cache.load_or_compile("GeneratedContainer", "cccccccccccccccc", false, || {
        Err(autowire_domain::Error::configuration("broken"))
    });
    assert!(result.is_err());
    assert!(!cache.dir().exists());
}

fn logger_catalog(implements: bool) -> TypeCatalog {
    let logger = ClassInfo::class("Logger").constructor(vec![], |_| Ok(Logger { prefix: "app".to_string() }));
    let logger = if implements {
        logger.implements_as::<Logger, dyn Log>("LoggerInterface", |logger| logger)
    } else {
        logger
    };
    TypeCatalog::new()
        .with(ClassInfo::interface("LoggerInterface"))
        .with(logger)
        .with(ClassInfo::class("App").constructor(
            vec![Parameter::service("logger", "LoggerInterface").nullable()],
            |args| Ok(args.optional_service::<Logger>("logger")?.is_some()),
        ))
}

#[test]
fn test_catalog_hierarchy_changes_the_fingerprint() {
    let digest = |catalog: &TypeCatalog| {
        Fingerprint::new().catalog(catalog).expect("catalog").finish()
    };
    assert_eq!(digest(&logger_catalog(false)), digest(&logger_catalog(false)));
    assert_ne!(digest(&logger_catalog(false)), digest(&logger_catalog(true)));
}

#[test]
fn test_catalog_change_recompiles_cached_container() {
    let dir = TempDir::new().expect("temp dir");
    let boot = |implements: bool| {
        Bootstrap::new(logger_catalog(implements))
            .with_loader(ConfigLoader::new().without_env())
            .with_default_extensions()
            .expect("extensions")
            .set_cache_dir(dir.path())
            .add_config(json!({ "services": { "logger": "Logger", "app": "App" } }))
            .expect("config")
            .create_container()
            .expect("container")
    };

    let before = boot(false);
    assert!(!*before.get_as::<bool>("app").expect("app"));

    let after = boot(true);
    assert!(*after.get_as::<bool>("app").expect("app"));
}
