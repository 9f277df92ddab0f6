//! Value objects shared by the compile and runtime phases

pub mod natural;
pub mod parameters;
pub mod suggestion;
pub mod wiring;

pub use parameters::Parameters;
pub use wiring::{WiringEntry, WiringTable};
