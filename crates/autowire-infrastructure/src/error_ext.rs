//! Error extension utilities
//!
//! Attaches context to foreign errors (I/O, figment, serde) while turning
//! them into the domain [`Error`].

use std::fmt;

use autowire_domain::error::{Error, Result};

/// Extension trait for adding context to errors
///
/// # Example
///
/// ```ignore
/// use autowire_infrastructure::error_ext::ErrorContext;
///
/// let text = std::fs::read_to_string(&path)
///     .io_context(format!("Failed to read artifact {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context, converting the error into an invalid-state error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Add lazily built context
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;

    /// Add context for I/O operations
    fn io_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Add context for configuration operations
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::invalid_state(format!("{context}: {err}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|err| Error::invalid_state(format!("{}: {err}", f())))
    }

    fn io_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::io_with_source(format!("{context}: {err}"), err))
    }

    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::configuration_with_source(format!("{context}: {err}"), err))
    }
}
