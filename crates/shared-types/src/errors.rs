//! # Error Types
//!
//! Defines the error type every outbound port reports.

use thiserror::Error;

/// Postgres unique-violation code, returned by PostgREST for duplicate rows.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors reported by the hosted backend or the transport to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Row already exists, or was already gone.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requested row or object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request did not complete within the configured bound.
    #[error("Timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Connection-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an error body.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether the error means "the remote already converged".
    pub fn is_conflict(&self) -> bool {
        match self {
            BackendError::Conflict(_) => true,
            BackendError::Api { code, status, .. } => code == PG_UNIQUE_VIOLATION || *status == 409,
            _ => false,
        }
    }
}
