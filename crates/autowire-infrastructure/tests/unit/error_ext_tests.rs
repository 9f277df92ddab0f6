//! Tests for error context helpers

use std::io;

use autowire_infrastructure::ErrorContext;

fn not_found() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
}

#[test]
fn test_io_context() {
    let error = not_found().io_context("Failed to read artifact").err().expect("error");
    assert_eq!(error.to_string(), "I/O error: Failed to read artifact: no such file");
}

#[test]
fn test_config_context() {
    let error = not_found().config_context("Failed to load").err().expect("error");
    assert_eq!(error.to_string(), "Configuration error: Failed to load: no such file");
}

#[test]
fn test_lazy_context() {
    let path = "plan.json";
    let error = not_found()
        .with_context(|| format!("Missing {path}"))
        .err()
        .expect("error");
    assert_eq!(error.to_string(), "Invalid state: Missing plan.json: no such file");
}
