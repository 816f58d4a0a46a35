//! Common type definitions shared across server layers
//!
//! - `app_id` - Canonical application identifiers
//! - `context` - Per-application collector context

pub mod app_id;
pub mod context;

// Re-export commonly used types at module level
pub use app_id::ApplicationId;
pub use context::CollectorContext;
