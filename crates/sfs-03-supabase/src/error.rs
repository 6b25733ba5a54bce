//! Adapter errors and their mapping onto `BackendError`.

use serde::Deserialize;
use shared_types::{BackendError, PG_UNIQUE_VIOLATION};
use thiserror::Error;

/// Error body returned by PostgREST and Storage.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Storage puts a short reason here.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    /// Storage reports its HTTP-ish status as a string field.
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl SupabaseError {
    pub fn from_reqwest(err: reqwest::Error, timeout_millis: u64) -> Self {
        if err.is_timeout() {
            SupabaseError::Timeout {
                millis: timeout_millis,
            }
        } else if err.is_decode() {
            SupabaseError::Decode(err.to_string())
        } else {
            SupabaseError::Transport(err.to_string())
        }
    }

    /// Builds a status error from a non-2xx response body.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed
            .code
            .or(parsed.status_code)
            .unwrap_or_else(|| status.to_string());
        let message = parsed
            .message
            .or(parsed.error)
            .or(parsed.details)
            .unwrap_or_else(|| body.trim().to_string());
        SupabaseError::Status {
            status,
            code,
            message,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SupabaseError::Status { status, code, .. }
            if *status == 409 || code == PG_UNIQUE_VIOLATION || code == "409")
    }
}

impl From<SupabaseError> for BackendError {
    fn from(err: SupabaseError) -> Self {
        match err {
            e if e.is_conflict() => BackendError::Conflict(e.to_string()),
            SupabaseError::Status {
                status: 401 | 403,
                message,
                ..
            } => BackendError::Unauthorized(message),
            SupabaseError::Status {
                status: 404,
                message,
                ..
            } => BackendError::NotFound(message),
            SupabaseError::Status {
                status,
                code,
                message,
            } => BackendError::Api {
                status,
                code,
                message,
            },
            SupabaseError::Timeout { millis } => BackendError::Timeout { millis },
            SupabaseError::Transport(msg) | SupabaseError::Config(msg) => {
                BackendError::Transport(msg)
            }
            SupabaseError::Decode(msg) => BackendError::Decode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = SupabaseError::from_body(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert!(err.is_conflict());
        assert!(matches!(BackendError::from(err), BackendError::Conflict(_)));
    }

    #[test]
    fn test_storage_duplicate_is_conflict() {
        let err = SupabaseError::from_body(
            400,
            r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn test_auth_failures() {
        let err = SupabaseError::from_body(401, r#"{"message":"JWT expired"}"#);
        assert_eq!(
            BackendError::from(err),
            BackendError::Unauthorized("JWT expired".into())
        );
    }

    #[test]
    fn test_unparseable_body_keeps_text() {
        let err = SupabaseError::from_body(502, "Bad Gateway");
        assert_eq!(
            BackendError::from(err),
            BackendError::Api {
                status: 502,
                code: "502".into(),
                message: "Bad Gateway".into()
            }
        );
    }
}
