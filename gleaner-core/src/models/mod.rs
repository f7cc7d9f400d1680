//! Domain models

pub use events::*;

mod events;
