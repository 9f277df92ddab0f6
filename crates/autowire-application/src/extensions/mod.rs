//! Built-in compiler extensions
//!
//! | Section | Extension | Purpose |
//! |---------|-----------|---------|
//! | `services` | [`ServicesExtension`] | Service definitions from configuration |
//! | `search` | [`SearchExtension`] | Catalog classes registered by mask |
//! | `di` | [`DiExtension`] | Services created when the container boots |

pub mod di;
pub mod search;
pub mod services;

pub use di::DiExtension;
pub use search::SearchExtension;
pub use services::ServicesExtension;
