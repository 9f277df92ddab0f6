//! Ports - interfaces implemented by outer layers
//!
//! | Port | Implemented by |
//! |------|----------------|
//! | [`ServiceLocator`] | the runtime container in `autowire-infrastructure` |

pub mod locator;

pub use locator::ServiceLocator;
