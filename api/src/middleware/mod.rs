//! Request middleware for the collector HTTP surface.

pub mod auth;

pub use auth::{AuthContext, TokenAuth, TokenVerifier, PRINCIPAL_HEADER};
