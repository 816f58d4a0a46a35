//! HTTP route handlers.

pub mod timeline;
