//! Domain-specific error types and error handling.

use thiserror::Error;
use tlc_shared::ApplicationId;

/// Token-related errors
///
/// Every variant belongs to the "invalid token" class: a caller holding a
/// token that fails with one of these must obtain a fresh token rather than
/// retry the same credential.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token not found in live set")]
    NotFound,

    #[error("token expired")]
    Expired,

    #[error("token past max lifetime, renewal not permitted")]
    MaxLifetimeExceeded,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token has been cancelled")]
    Cancelled,

    #[error("token generation failed: {message}")]
    GenerationFailed { message: String },
}

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Underlying persistence or I/O failure. Retryable by the caller.
    #[error("storage failure: {message}")]
    Storage { message: String },

    #[error("no collector registered for {app_id}")]
    CollectorNotFound { app_id: ApplicationId },

    #[error("collector for {app_id} has been removed")]
    CollectorRemoved { app_id: ApplicationId },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// True for the invalid-token error class: the credential itself is bad
    /// and retrying with it cannot succeed.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, CoreError::Token(_))
    }

    /// True for transient failures worth retrying on the caller's next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Storage { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
