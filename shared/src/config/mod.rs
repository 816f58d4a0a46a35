//! Configuration module with service-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `server` - HTTP server configuration
//! - `storage` - Entity storage layout configuration
//! - `token` - Delegation token lifecycle intervals

pub mod server;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use token::TokenConfig;
