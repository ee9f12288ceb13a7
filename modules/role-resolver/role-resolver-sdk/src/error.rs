//! Error types for role lookups.

use thiserror::Error;

use crate::models::ResolverState;

/// Failure of a single role lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleLookupError {
    /// The backend has no profile for this identity (HTTP 404).
    #[error("no user profile for '{0}'")]
    NotFound(String),

    /// The request never produced a response (connect error, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// The backend answered with an unexpected status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not a role record.
    #[error("malformed role payload: {0}")]
    Decode(String),

    /// The lookup was cancelled before it completed.
    #[error("role lookup cancelled")]
    Cancelled,
}

impl RoleLookupError {
    /// Resolver state this failure surfaces as.
    #[must_use]
    pub fn into_state(self) -> ResolverState {
        match self {
            Self::NotFound(_) => ResolverState::NotFound,
            other => ResolverState::Failed(other.to_string()),
        }
    }
}
