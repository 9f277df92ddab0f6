//! Tests for definitions, statements and parameters

use autowire_domain::{Argument, Entity, Parameters, Reference, ServiceDefinition, Statement};
use serde_json::json;

#[test]
fn test_reference_parsing() {
    assert_eq!(Reference::parse("@logger"), Some(Reference::service("logger")));
    assert_eq!(Reference::parse("@self"), Some(Reference::This));
    assert_eq!(Reference::parse("@container"), Some(Reference::Container));
    assert_eq!(Reference::parse("@"), None);
    assert_eq!(Reference::parse("logger"), None);
}

#[test]
fn test_statement_from_text() {
    let statement = Statement::from("Pool::create").arg(json!(4)).named_arg("name", Argument::service("db"));
    assert_eq!(
        statement.entity,
        Entity::StaticMethod {
            class: "Pool".to_string(),
            method: "create".to_string()
        }
    );
    assert_eq!(statement.arguments.positional, vec![Argument::value(4)]);
    assert_eq!(statement.arguments.named.get("name"), Some(&Argument::service("db")));
}

#[test]
fn test_definition_serializes_with_type_key() {
    let mut definition = ServiceDefinition::new("mailer");
    definition.set_type("Mailer").add_tag("run", true).set_shared(false);
    let value = serde_json::to_value(&definition).expect("serialize");
    assert_eq!(value["type"], json!("Mailer"));
    assert_eq!(value["shared"], json!(false));
    let back: ServiceDefinition = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, definition);
}

#[test]
fn test_parameter_expansion_keeps_types_and_interpolates() {
    let parameters = Parameters::from_value(json!({
        "db": { "host": "localhost", "port": 5432 },
        "dsn": "pgsql://%db.host%:%db.port%",
        "ratio": "100%%"
    }))
    .expect("parameters");

    assert_eq!(parameters.expand(&json!("%db.port%")).ok(), Some(json!(5432)));
    assert_eq!(parameters.expand(&json!("%dsn%")).ok(), Some(json!("pgsql://localhost:5432")));
    assert_eq!(parameters.expand(&json!("%ratio%")).ok(), Some(json!("100%")));
}

#[test]
fn test_parameter_cycles_are_reported() {
    let parameters = Parameters::from_value(json!({ "a": "%b%", "b": "%a%" })).expect("parameters");
    let error = parameters.resolved().expect_err("cycle");
    assert!(
        error.to_string().contains("Circular reference detected for parameters: %b%, %a%, %b%"),
        "{error}"
    );
}
