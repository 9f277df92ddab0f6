//! Tests for log level parsing

use autowire_infrastructure::logging::parse_log_level;
use tracing::Level;

#[test]
fn test_known_levels() {
    assert_eq!(parse_log_level("trace").ok(), Some(Level::TRACE));
    assert_eq!(parse_log_level("DEBUG").ok(), Some(Level::DEBUG));
    assert_eq!(parse_log_level("info").ok(), Some(Level::INFO));
    assert_eq!(parse_log_level("warning").ok(), Some(Level::WARN));
    assert_eq!(parse_log_level("error").ok(), Some(Level::ERROR));
}

#[test]
fn test_unknown_level() {
    let error = parse_log_level("verbose").err().expect("invalid");
    assert_eq!(
        error.to_string(),
        "Configuration error: Invalid log level: verbose. Use trace, debug, info, warn, or error"
    );
}
