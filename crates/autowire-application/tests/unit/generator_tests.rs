//! Tests for container generation and rendering

use autowire_application::generator::render;
use autowire_application::{CodeGenerator, Compiler, DiExtension, Expr, GeneratedContainer, ServicesExtension};
use autowire_domain::{Error, Reference, SetupCall};
use serde_json::json;

use crate::fixtures::builder;

fn compile(config: serde_json::Value) -> GeneratedContainer {
    let mut compiler = Compiler::new(builder());
    compiler
        .add_extension("services", ServicesExtension::new())
        .expect("services")
        .add_extension("di", DiExtension::new())
        .expect("di");
    compiler.add_config(config).expect("config");
    compiler.compile().expect("compile")
}

fn config() -> serde_json::Value {
    json!({
        "parameters": { "dsn": "redis://cache:6379" },
        "services": {
            "logger": { "factory": "Logger", "tags": { "run": { "priority": 10 } } },
            "cache2": { "factory": "RedisCache", "arguments": ["%dsn%"] },
            "cache10": "MemoryCache",
            "router": "Router",
            "app": "App",
            "main": "@app"
        }
    })
}

#[test]
fn test_compilation_is_deterministic() {
    let first = render(&compile(config())).expect("render");
    let second = render(&compile(config())).expect("render");
    assert_eq!(first, second);
}

#[test]
fn test_rendered_source_declares_one_method_per_service() {
    let source = render(&compile(config())).expect("render");
    assert!(source.contains("pub mod generated_container {"), "{source}");
    for service in ["app", "cache10", "cache2", "logger", "main", "router"] {
        assert!(
            source.contains(&format!("pub fn create_service_{service}() -> ServiceMethod {{")),
            "missing method for {service}"
        );
    }
    assert!(source.contains(r#"wiring.add("Cache", "cache2", true);"#), "{source}");
}

#[test]
fn test_references_become_getters() {
    let container = compile(config());
    assert_eq!(container.methods["main"].create, Expr::service("app"));
    assert_eq!(container.methods["main"].type_name, "App");
    assert_eq!(
        container.methods["router"].create,
        Expr::Construct {
            class: "Router".to_string(),
            args: vec![Expr::List {
                items: vec![Expr::service("cache2"), Expr::service("cache10")]
            }],
        }
    );
    assert_eq!(
        container.methods["cache2"].create,
        Expr::Construct {
            class: "RedisCache".to_string(),
            args: vec![Expr::literal("redis://cache:6379")],
        }
    );
    assert_eq!(container.initialize, vec![Expr::service("logger")]);
}

#[test]
fn test_json_artifact_loads_back() {
    let container = compile(config());
    let text = container.to_json().expect("json");
    let loaded = GeneratedContainer::from_json(&text).expect("load");
    assert_eq!(loaded, container);
}

#[test]
fn test_colliding_method_names_are_rejected() {
    let mut builder = builder();
    builder.register("cache.main", "MemoryCache");
    builder.register("cache_main", "MemoryCache");
    builder.register("alias", autowire_domain::Statement::reference(Reference::service("cache.main")));
    let registry = builder.freeze().expect("freeze");

    let error = CodeGenerator::new("Container")
        .generate(&registry)
        .expect_err("collision");
    assert!(
        error.to_string().contains("both map to generated method create_service_cache_main()"),
        "{error}"
    );
}

#[test]
fn test_service_passed_to_its_own_setup_is_rejected() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    builder
        .register("audit", "Mailer")
        .set_argument("host", json!("localhost"))
        .add_setup(SetupCall::new("set_logger").arg(Reference::service("audit")));
    let registry = builder.freeze().expect("freeze");

    let error = CodeGenerator::new("Container")
        .generate(&registry)
        .expect_err("self in setup");
    assert!(matches!(error, Error::Configuration { .. }), "{error:?}");
    assert_eq!(
        error.to_string(),
        "Configuration error: Service 'audit' cannot receive itself (@self) as a setup argument."
    );
}

#[test]
fn test_rendered_literals_use_rust_escapes() {
    let container = compile(json!({
        "parameters": { "banner": "\u{1b}[1mready\u{7}", "quote": "say \"hi\"\n" },
        "services": {
            "cache2": { "factory": "RedisCache", "arguments": ["%banner%"] },
            "cache10": { "factory": "RedisCache", "arguments": ["%quote%"] }
        }
    }));
    let source = render(&container).expect("render");

    assert!(source.contains("use autowire::serde_json::json;"), "{source}");
    assert!(!source.contains("\\u00"), "{source}");
    assert!(
        source.contains(r#"Expr::Literal { value: json!("\u{1b}[1mready\u{7}") }"#),
        "{source}"
    );
    assert!(
        source.contains(r#"Expr::Literal { value: json!("say \"hi\"\n") }"#),
        "{source}"
    );
    assert!(source.contains(r#""banner": "\u{1b}[1mready\u{7}""#), "{source}");
}
