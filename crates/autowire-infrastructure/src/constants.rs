//! Infrastructure layer constants
//!
//! Domain-level naming constants live in `autowire_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "AUTOWIRE";

/// Separator between nested keys in environment variable names
pub const CONFIG_ENV_SEPARATOR: &str = "__";

/// Configuration section holding the container settings themselves
pub const CONTAINER_SECTION: &str = "container";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_ENV_FILTER: &str = "AUTOWIRE_LOG";

// ============================================================================
// ARTIFACT CACHE CONSTANTS
// ============================================================================

/// Number of hex characters of the fingerprint kept in artifact names
pub const FINGERPRINT_LENGTH: usize = 16;

/// Extension of the serialized plan
pub const PLAN_EXTENSION: &str = "json";

/// Extension of the rendered source
pub const SOURCE_EXTENSION: &str = "rs";

/// Suffix of files being written before they are renamed into place
pub const TEMP_SUFFIX: &str = "tmp";
