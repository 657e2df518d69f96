//! Domain error taxonomy shared by the coordinator, the identity resolver
//! and the command layer.

use thiserror::Error;

use crate::store::StoreError;
use crate::token::TokenError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// A required field is missing or the payload has nothing to apply.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(#[from] TokenError),

    /// The addressed record, or its embedded copy, does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller's email has no user document.
    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request deadline passed before the write was committed.
    #[error("store operation timed out")]
    Timeout,
}

impl PlannerError {
    pub fn not_found(label: &str) -> Self {
        PlannerError::NotFound(label.to_string())
    }
}
