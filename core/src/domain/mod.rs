//! Domain layer: entities owned by the collector core.

pub mod entities;

pub use entities::*;
