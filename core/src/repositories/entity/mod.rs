//! Entity writer interface and in-memory implementation.

mod memory;
#[path = "trait.rs"]
mod trait_;

pub use memory::MemoryEntityWriter;
pub use trait_::EntityWriter;
