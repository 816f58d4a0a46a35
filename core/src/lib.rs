//! # Timeline Collector Core
//!
//! Core business logic for the per-node timeline collector. This crate
//! contains the delegation token lifecycle state machine, the per-application
//! collector registry, the storage writer interface, and the error types
//! shared across the service layers.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
