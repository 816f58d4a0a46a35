use actix_web::{http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

use tlc_core::errors::{CoreError, TokenError};

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn to_response(&self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// Maps a core failure onto an HTTP response.
///
/// Invalid-token failures map to 401 so the client regenerates its
/// credential; transient storage failures map to 503 so the client
/// retries the same request.
pub fn core_error_response(error: &CoreError) -> HttpResponse {
    let (status, code) = match error {
        CoreError::Token(token_error) => (StatusCode::UNAUTHORIZED, token_code(token_error)),
        CoreError::Storage { .. } => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_FAILURE"),
        CoreError::CollectorNotFound { .. } => (StatusCode::NOT_FOUND, "COLLECTOR_NOT_FOUND"),
        CoreError::CollectorRemoved { .. } => (StatusCode::GONE, "COLLECTOR_REMOVED"),
        CoreError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    ErrorResponse::new(code, error.to_string()).to_response(status)
}

fn token_code(error: &TokenError) -> &'static str {
    match error {
        TokenError::NotFound => "TOKEN_NOT_FOUND",
        TokenError::Expired => "TOKEN_EXPIRED",
        TokenError::MaxLifetimeExceeded => "TOKEN_MAX_LIFETIME_EXCEEDED",
        TokenError::InvalidSignature => "TOKEN_INVALID_SIGNATURE",
        TokenError::Cancelled => "TOKEN_CANCELLED",
        TokenError::GenerationFailed { .. } => "TOKEN_GENERATION_FAILED",
    }
}
