//! Error types for microsvc command handlers.

use thiserror::Error;

use crate::error::PlannerError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Error type for command handler operations.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Payload decode / deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Payload decoded but is missing required data.
    #[error("{0}")]
    Validation(String),
    /// Guard rejected the command (input validation failed).
    #[error("guard rejected command: {0}")]
    GuardRejected(String),
    /// Missing, invalid or expired session credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Record, embedded copy or user not found.
    #[error("{0} not found")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The store did not answer within the request deadline.
    #[error("request timed out")]
    Timeout,
    /// Other error.
    #[error("handler error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl From<TokenError> for HandlerError {
    fn from(err: TokenError) -> Self {
        HandlerError::Unauthorized(err.to_string())
    }
}

impl From<PlannerError> for HandlerError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::Validation(msg) => HandlerError::Validation(msg),
            PlannerError::Unauthorized(token) => token.into(),
            PlannerError::NotFound(label) => HandlerError::NotFound(label),
            PlannerError::UserNotFound => HandlerError::NotFound("User".into()),
            PlannerError::Store(e) => HandlerError::Store(e),
            PlannerError::Timeout => HandlerError::Timeout,
        }
    }
}

impl HandlerError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::Validation(_) => 400,
            HandlerError::GuardRejected(_) => 400,
            HandlerError::Unauthorized(_) => 401,
            HandlerError::NotFound(_) => 404,
            HandlerError::Store(_) => 500,
            HandlerError::Timeout => 504,
            HandlerError::Other(_) => 500,
        }
    }
}
