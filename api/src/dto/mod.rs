//! Request and response payloads for the collector HTTP surface.

pub mod error;
pub mod timeline;

pub use error::ErrorResponse;
pub use timeline::{
    PublishRequest, PublishResponse, RegisterRequest, RegisterResponse, RemoveResponse,
    TokenResponse,
};
