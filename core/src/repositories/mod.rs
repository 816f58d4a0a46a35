//! Repository interfaces the core depends on.

pub mod entity;

pub use entity::{EntityWriter, MemoryEntityWriter};
