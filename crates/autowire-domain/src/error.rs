//! Error handling types
//!
//! Every failure of the container surfaces through [`Error`]. None of them
//! is retried: resolution is pure over a frozen registry, so a second
//! attempt cannot produce a different outcome.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the container
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (cache directory, configuration files)
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Invalid configuration, duplicate names, schema violations
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// More than one autowired service matches a requested type
    #[error("Multiple services of type {type_name} found: {}", .candidates.join(", "))]
    AmbiguousType {
        /// The requested type
        type_name: String,
        /// Candidate service names in natural order
        candidates: Vec<String>,
    },

    /// No service with the requested name
    #[error("Service '{name}' not found.{}", hint_suffix(.hint.as_deref()))]
    ServiceNotFound {
        /// The requested service name
        name: String,
        /// Optional hint (near-miss name)
        hint: Option<String>,
    },

    /// The type exists in the catalog but no autowired service provides it
    #[error("Service of type {type_name} not found. Did you add it to configuration?{}", hint_suffix(.hint.as_deref()))]
    TypeNotRegistered {
        /// The requested type
        type_name: String,
        /// Optional hint (non-autowired candidates)
        hint: Option<String>,
    },

    /// The type is unknown to the type catalog
    #[error("Type '{type_name}' not found in the type catalog.")]
    TypeNotFound {
        /// The requested type
        type_name: String,
    },

    /// A service depends on itself, directly or transitively
    #[error("Circular reference detected for services: {}", .chain.join(" -> "))]
    CircularReference {
        /// Every service on the construction chain, closed by the repeated one
        chain: Vec<String>,
    },

    /// A factory could not be resolved or did not yield an object
    #[error("Service '{service}': {message}")]
    ServiceCreation {
        /// The offending service
        service: String,
        /// What went wrong
        message: String,
    },

    /// A parameter lookup failed
    #[error("Missing parameter '{key}'.{}{}", suggestion_suffix(.suggestions), nested_suffix(.nested.as_deref()))]
    ParameterNotFound {
        /// The requested dotted key
        key: String,
        /// Near-miss keys
        suggestions: Vec<String>,
        /// Sub-key whose value is not a map, when nested access was attempted
        nested: Option<String>,
    },

    /// Abstract classes and interfaces cannot be constructed
    #[error("Class '{class}' is not instantiable: {reason}")]
    NotInstantiable {
        /// The requested class
        class: String,
        /// Why construction is impossible
        reason: String,
    },

    /// A runtime service does not match its declared type
    #[error("Service '{service}' must be instance of {expected}, {actual} given.")]
    TypeMismatch {
        /// The service name
        service: String,
        /// Declared type
        expected: String,
        /// Actual class of the supplied instance
        actual: String,
    },

    /// The operation is not allowed in the current state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the violated state
        message: String,
    },

    /// An error raised while resolving a specific service or parameter
    #[error("{context}: {source}")]
    Resolution {
        /// Where the failure happened (service, parameter, extension)
        context: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },
}

fn hint_suffix(hint: Option<&str>) -> String {
    hint.map(|h| format!(" {h}")).unwrap_or_default()
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    match suggestions {
        [] => String::new(),
        [only] => format!(" Did you mean '{only}'?"),
        many => format!(" Did you mean one of '{}'?", many.join("', '")),
    }
}

fn nested_suffix(nested: Option<&str>) -> String {
    nested
        .map(|key| format!(" Value of '{key}' is not an array, nested access is impossible."))
        .unwrap_or_default()
}

// Basic error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

// Resolution error creation methods
impl Error {
    /// Create an ambiguity error, candidates are sorted naturally
    pub fn ambiguous<S: Into<String>>(type_name: S, mut candidates: Vec<String>) -> Self {
        crate::value_objects::natural::sort(&mut candidates);
        Self::AmbiguousType {
            type_name: type_name.into(),
            candidates,
        }
    }

    /// Create a missing service error
    pub fn service_not_found<S: Into<String>>(name: S) -> Self {
        Self::ServiceNotFound {
            name: name.into(),
            hint: None,
        }
    }

    /// Create a missing service error with a hint
    pub fn service_not_found_with_hint<S: Into<String>, H: Into<String>>(name: S, hint: H) -> Self {
        Self::ServiceNotFound {
            name: name.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a type-not-registered error
    pub fn type_not_registered<S: Into<String>>(type_name: S, hint: Option<String>) -> Self {
        Self::TypeNotRegistered {
            type_name: type_name.into(),
            hint,
        }
    }

    /// Create an unknown-type error
    pub fn type_not_found<S: Into<String>>(type_name: S) -> Self {
        Self::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(chain: Vec<String>) -> Self {
        Self::CircularReference { chain }
    }

    /// Create a service creation error
    pub fn service_creation<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ServiceCreation {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a not-instantiable error
    pub fn not_instantiable<S: Into<String>, R: Into<String>>(class: S, reason: R) -> Self {
        Self::NotInstantiable {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch<S: Into<String>, E: Into<String>, A: Into<String>>(
        service: S,
        expected: E,
        actual: A,
    ) -> Self {
        Self::TypeMismatch {
            service: service.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Wrap the error with the place where it happened
    #[must_use]
    pub fn in_context<S: Into<String>>(self, context: S) -> Self {
        Self::Resolution {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

// Inspection methods
impl Error {
    /// The innermost error, skipping every [`Error::Resolution`] layer
    pub fn root(&self) -> &Error {
        match self {
            Self::Resolution { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the root error reports a missing service, type or registration
    pub fn is_missing_service(&self) -> bool {
        matches!(
            self.root(),
            Self::ServiceNotFound { .. } | Self::TypeNotRegistered { .. } | Self::TypeNotFound { .. }
        )
    }

    /// Whether the root error is an ambiguous by-type lookup
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.root(), Self::AmbiguousType { .. })
    }

    /// Whether the root error is a circular reference
    pub fn is_circular(&self) -> bool {
        matches!(self.root(), Self::CircularReference { .. })
    }
}
