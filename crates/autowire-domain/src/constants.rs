//! Domain constants

// ============================================================================
// REFERENCE CONSTANTS
// ============================================================================

/// Reference prefix used in configuration (`"@logger"`)
pub const REFERENCE_PREFIX: char = '@';

/// Reference name standing for the service under construction
pub const SELF_REFERENCE: &str = "self";

/// Reference name standing for the container itself
pub const CONTAINER_REFERENCE: &str = "container";

/// Separator between class and static method (`"Factory::create"`)
pub const METHOD_SEPARATOR: &str = "::";

// ============================================================================
// GENERATOR CONSTANTS
// ============================================================================

/// Prefix of generated service methods
pub const SERVICE_METHOD_PREFIX: &str = "create_service_";

/// Default name of the generated container
pub const DEFAULT_CONTAINER_CLASS: &str = "GeneratedContainer";

// ============================================================================
// TAG CONSTANTS
// ============================================================================

/// Services carrying this tag are created when the container boots
pub const RUN_TAG: &str = "run";
