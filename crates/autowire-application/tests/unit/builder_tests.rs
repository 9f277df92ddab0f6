//! Tests for the container builder

use autowire_domain::Error;
use serde_json::json;

use crate::fixtures::builder;

// ============================================================================
// Definitions and aliases
// ============================================================================

#[test]
fn test_add_definition_rejects_duplicates() {
    let mut builder = builder();
    builder.add_definition("logger").expect("first").set_type("Logger");
    let error = builder.add_definition("logger").expect_err("duplicate");
    assert!(matches!(error, Error::Configuration { .. }), "{error}");
}

#[test]
fn test_alias_cycles_are_rejected() {
    let mut builder = builder();
    builder.add_alias("a", "b").expect("a -> b");
    builder.add_alias("b", "c").expect("b -> c");
    let error = builder.add_alias("c", "a").expect_err("cycle");
    assert_eq!(
        error.to_string(),
        "Configuration error: Alias cycle detected: c -> a -> b -> c"
    );
    assert!(builder.add_alias("self", "self").is_err(), "self alias must be rejected");
}

#[test]
fn test_alias_cannot_shadow_service() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    assert!(builder.add_alias("logger", "other").is_err());
    assert!(builder.add_alias("", "logger").is_err());
}

#[test]
fn test_get_definition_follows_aliases_and_suggests() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    builder.add_alias("log", "logger").expect("alias");
    assert_eq!(builder.get_definition("log").map(|d| d.name().to_string()).ok(), Some("logger".to_string()));

    let error = builder.get_definition("loger").expect_err("missing");
    let message = error.to_string();
    assert!(message.starts_with("Service 'loger' not found. Did you mean"), "{message}");
    assert!(message.contains("'logger'"), "{message}");
}

// ============================================================================
// Wiring
// ============================================================================

#[test]
fn test_find_by_type_covers_ancestors_in_natural_order() {
    let mut builder = builder();
    builder.register("cache10", "MemoryCache");
    builder.register("cache2", "RedisCache");
    assert_eq!(builder.find_by_type("Cache"), vec!["cache2", "cache10"]);
    assert_eq!(builder.find_by_type("BaseCache"), vec!["cache2"]);
}

#[test]
fn test_wiring_tracks_mutations() {
    let mut builder = builder();
    builder.register("logger", "Logger");
    assert_eq!(builder.resolve_by_type("LoggerInterface").ok(), Some("logger".to_string()));

    builder.get_definition_mut("logger").expect("logger").set_autowired(false);
    assert!(builder.find_autowired("LoggerInterface").is_empty());
    assert_eq!(builder.find_by_type("LoggerInterface"), vec!["logger"]);

    let error = builder.resolve_by_type("LoggerInterface").expect_err("not autowired");
    assert!(
        error.to_string().contains("Service(s) 'logger' of this type exist but are not autowired."),
        "{error}"
    );

    builder.remove_definition("logger");
    assert!(builder.find_by_type("Logger").is_empty());
}

#[test]
fn test_by_type_errors_distinguish_unknown_and_unregistered() {
    let mut builder = builder();
    builder.register("cache1", "RedisCache");
    builder.register("cache2", "MemoryCache");

    let ambiguous = builder.resolve_by_type("Cache").expect_err("ambiguous");
    assert_eq!(ambiguous.to_string(), "Multiple services of type Cache found: cache1, cache2");

    let unregistered = builder.resolve_by_type("Mailer").expect_err("unregistered");
    assert!(matches!(unregistered, Error::TypeNotRegistered { .. }), "{unregistered}");

    let unknown = builder.resolve_by_type("Nope").expect_err("unknown");
    assert!(matches!(unknown, Error::TypeNotFound { .. }), "{unknown}");
}

#[test]
fn test_find_by_tag() {
    let mut builder = builder();
    builder.register("logger", "Logger").add_tag("run", true);
    builder.register("mailer", "Mailer").add_tag("run", json!({ "priority": 1 }));
    builder.register("app", "App");

    let tagged = builder.find_by_tag("run");
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged.get("mailer"), Some(&json!({ "priority": 1 })));
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_parameters() {
    let mut builder = builder();
    builder.set_parameter("mail.host", json!("smtp.local")).expect("set");
    assert_eq!(builder.get_parameter("mail.host").ok(), Some(&json!("smtp.local")));
    assert!(builder.get_parameter("mail.port").is_err());
}
