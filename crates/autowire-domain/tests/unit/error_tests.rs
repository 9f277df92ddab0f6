//! Tests for error messages and inspection

use autowire_domain::Error;

#[test]
fn test_ambiguous_candidates_are_naturally_sorted() {
    let error = Error::ambiguous("Cache", vec!["cache10".into(), "cache2".into(), "Cache1".into()]);
    assert_eq!(
        error.to_string(),
        "Multiple services of type Cache found: Cache1, cache2, cache10"
    );
}

#[test]
fn test_missing_name_and_missing_type_read_differently() {
    let by_name = Error::service_not_found("mailer");
    let by_type = Error::type_not_registered("Mailer", None);
    let unknown = Error::type_not_found("Mailer");

    assert_eq!(by_name.to_string(), "Service 'mailer' not found.");
    assert_eq!(
        by_type.to_string(),
        "Service of type Mailer not found. Did you add it to configuration?"
    );
    assert_eq!(unknown.to_string(), "Type 'Mailer' not found in the type catalog.");
    assert_ne!(by_name.to_string(), by_type.to_string());
}

#[test]
fn test_circular_reference_names_every_service() {
    let error = Error::circular_reference(vec!["a".into(), "b".into(), "a".into()]);
    assert_eq!(error.to_string(), "Circular reference detected for services: a -> b -> a");
    assert!(error.is_circular());
}

#[test]
fn test_context_layers_keep_root() {
    let error = Error::service_not_found("logger")
        .in_context("Parameter 'logger' in App::new()")
        .in_context("Service 'app'");
    assert_eq!(
        error.to_string(),
        "Service 'app': Parameter 'logger' in App::new(): Service 'logger' not found."
    );
    assert!(error.is_missing_service());
    assert!(!error.is_ambiguous());
    assert!(matches!(error.root(), Error::ServiceNotFound { .. }));
}

#[test]
fn test_parameter_not_found_mentions_nested_access() {
    let error = Error::ParameterNotFound {
        key: "db.host.name".into(),
        suggestions: vec![],
        nested: Some("db.host".into()),
    };
    assert!(error.to_string().contains("nested access is impossible"), "{error}");
}
