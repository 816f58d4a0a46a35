//! Shared configuration and common types for the timeline collector server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (token lifecycle, HTTP server, storage layout)
//! - Common identifier types (application ids, collector context)

pub mod config;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{ServerConfig, StorageConfig, TokenConfig};
pub use types::{ApplicationId, CollectorContext};
