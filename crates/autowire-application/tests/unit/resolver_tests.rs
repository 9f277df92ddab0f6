//! Tests for definition completion on freeze

use autowire_domain::{Argument, Entity, Error, Reference, SetupCall, Statement};
use serde_json::json;

use crate::fixtures::builder;

fn service(name: &str) -> Argument {
    Argument::Reference(Reference::service(name))
}

#[test]
fn test_constructor_dependencies_are_autowired() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    builder.register("app", "App");

    let registry = builder.freeze().expect("freeze");
    let app = registry.definition("app").expect("app");
    assert_eq!(app.type_name(), Some("App"));
    assert_eq!(app.arguments().map(|a| a.positional.clone()), Some(vec![service("logger")]));
}

#[test]
fn test_missing_dependency_names_service_and_parameter() {
    let mut builder = builder();
    builder.register("app", "App");

    let error = builder.freeze().expect_err("logger is missing");
    let message = error.to_string();
    assert!(message.starts_with("Service 'app': Parameter 'logger' in App::new()"), "{message}");
    assert!(message.contains("Service of type LoggerInterface not found"), "{message}");
    assert!(error.is_missing_service());
}

#[test]
fn test_defaults_and_parameters_fill_literals() {
    let mut builder = builder();
    builder.set_parameter("mail.host", json!("smtp.local")).expect("parameter");
    builder.register("cache", "RedisCache");
    builder
        .register("mailer", "Mailer")
        .set_argument("host", json!("%mail.host%"));

    let registry = builder.freeze().expect("freeze");
    let cache = registry.definition("cache").and_then(|d| d.arguments()).expect("cache args");
    assert_eq!(cache.positional, vec![Argument::value("redis://localhost")]);

    let mailer = registry.definition("mailer").and_then(|d| d.arguments()).expect("mailer args");
    assert_eq!(mailer.positional, vec![Argument::value("smtp.local"), Argument::value(25)]);
}

#[test]
fn test_collection_parameters_receive_every_autowired_service() {
    let mut builder = builder();
    builder.register("cache10", "RedisCache");
    builder.register("cache2", "MemoryCache");
    builder.register("router", "Router");

    let registry = builder.freeze().expect("freeze");
    let router = registry.definition("router").and_then(|d| d.arguments()).expect("args");
    assert_eq!(
        router.positional,
        vec![Argument::List(vec![service("cache2"), service("cache10")])]
    );
}

#[test]
fn test_static_factory_and_class_shorthand() {
    let mut builder = builder();
    builder.register("db", Statement::static_method("Connection", "open").arg(json!("sqlite::memory:")));
    builder.add_definition("logger").expect("logger").set_type("Logger");

    let registry = builder.freeze().expect("freeze");
    assert_eq!(registry.definition("db").and_then(|d| d.type_name()), Some("Connection"));
    let logger = registry.definition("logger").and_then(|d| d.factory()).expect("factory");
    assert_eq!(logger.entity, Entity::Class("Logger".to_string()));
}

#[test]
fn test_abstract_class_is_not_instantiable() {
    let mut builder = builder();
    builder.register("cache", "BaseCache");
    let error = builder.freeze().expect_err("abstract");
    assert!(matches!(error.root(), Error::NotInstantiable { .. }), "{error}");
}

#[test]
fn test_declared_type_must_match_factory() {
    let mut builder = builder();
    builder.register("logger", "Logger").set_type("Cache");
    let error = builder.freeze().expect_err("incompatible");
    assert!(error.to_string().contains("not compatible with declared type Cache"), "{error}");
}

#[test]
fn test_interface_definition_resolves_to_concrete_type() {
    let mut builder = builder();
    builder
        .add_interface_definition("cache")
        .expect("binding")
        .set_interface("Cache")
        .result_mut()
        .set_type("MemoryCache");
    builder.register("router", "Router");

    let registry = builder.freeze().expect("freeze");
    assert_eq!(registry.definition("cache").and_then(|d| d.type_name()), Some("MemoryCache"));
    assert_eq!(registry.wiring().autowired("Cache"), ["cache".to_string()]);
}

#[test]
fn test_interface_definition_with_several_implementors_is_rejected() {
    let mut builder = builder();
    builder
        .add_interface_definition("cache")
        .expect("binding")
        .set_interface("Cache");
    let error = builder.freeze().expect_err("two implementors");
    assert!(error.to_string().contains("Multiple types implement Cache"), "{error}");
}

#[test]
fn test_alias_target_must_exist() {
    let mut builder = builder();
    builder.add_alias("log", "logger").expect("alias");
    let error = builder.freeze().expect_err("dangling alias");
    assert!(error.to_string().starts_with("Alias 'log': Service 'logger' not found."), "{error}");
}

#[test]
fn test_setup_arguments_are_autowired_and_self_is_kept() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    builder
        .register("mailer", "Mailer")
        .set_argument("host", json!("localhost"))
        .add_setup(SetupCall::new("set_logger"));
    builder
        .register("audit", "Mailer")
        .set_argument("host", json!("localhost"))
        .add_setup(SetupCall::new("set_logger").arg(Reference::service("audit")));

    let registry = builder.freeze().expect("freeze");
    let mailer = registry.definition("mailer").expect("mailer");
    assert_eq!(mailer.setup()[0].arguments.positional, vec![service("logger")]);
    let audit = registry.definition("audit").expect("audit");
    assert_eq!(
        audit.setup()[0].arguments.positional,
        vec![Argument::Reference(Reference::This)]
    );
}

#[test]
fn test_unknown_setup_method_is_reported() {
    let mut builder = builder();
    builder.register("logger", "Logger").add_setup(SetupCall::new("set_level"));
    let error = builder.freeze().expect_err("unknown setter");
    assert_eq!(
        error.to_string(),
        "Service 'logger': Setup method Logger::set_level() is not declared."
    );
}
