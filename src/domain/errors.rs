//! Domain error types
//!
//! This module defines the error hierarchy for Registrar. Transport-level
//! failures live in [`RemoteError`]; everything an orchestration step can
//! report to its caller is a [`RegistrarError`]. Neither type exposes
//! third-party HTTP client types.

use serde_json::Value;
use thiserror::Error;

/// Main Registrar error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Registry API errors
    #[error("Registry API error: {0}")]
    Remote(#[from] RemoteError),

    /// A multipart upload failed and was aborted on the server
    #[error("Upload of blob {blob_id} aborted: {source}")]
    UploadAborted {
        blob_id: String,
        #[source]
        source: Box<RegistrarError>,
    },

    /// The server reported that a blob upload ended in the ABORTED state
    #[error("Blob {0} upload was aborted by the server")]
    BlobAborted(String),

    /// An asynchronous task finished in the FAILED state
    #[error("Task failed: {message} ({} error(s))", .errors.len())]
    TaskFailed { message: String, errors: Vec<Value> },

    /// More than one registered record matched a uniqueness key
    #[error("Reconciliation conflict: {matches} registered records match {key}")]
    ReconciliationConflict { key: String, matches: usize },

    /// A bulk response did not line up with its request
    #[error("Response mismatch for {context}: expected {expected} item(s), got {actual}")]
    ResponseMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Operation interrupted by a shutdown signal
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Operation ran past its configured deadline
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl RegistrarError {
    /// True when the error is a 429 from the registry
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RegistrarError::Remote(RemoteError::RateLimited { .. }))
    }

    /// HTTP status of a failed request, if the error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistrarError::Remote(RemoteError::RequestFailed { status, .. }) => Some(*status),
            RegistrarError::Remote(RemoteError::RateLimited { .. }) => Some(429),
            RegistrarError::UploadAborted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True when the error came from a cancellation or a deadline
    pub fn is_interruption(&self) -> bool {
        match self {
            RegistrarError::Cancelled(_) | RegistrarError::DeadlineExceeded(_) => true,
            RegistrarError::UploadAborted { source, .. } => source.is_interruption(),
            _ => false,
        }
    }
}

/// Registry transport errors
///
/// Classification of a single request/response exchange with the registry.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered 429; the call may be retried
    #[error("Rate limit exceeded (429): {body}")]
    RateLimited { body: Value },

    /// Any other status >= 400; not retried
    #[error("Server returned status {status}: {body}")]
    RequestFailed { status: u16, body: Value },

    /// Failed to reach the server
    #[error("Failed to connect to registry: {0}")]
    ConnectionFailed(String),

    /// Response body could not be understood
    #[error("Invalid response from registry: {0}")]
    InvalidResponse(String),

    /// Backoff gave up after the configured number of retries
    #[error("Still rate limited after {attempts} attempt(s)")]
    RetriesExhausted { attempts: usize },
}

// Conversion from std::io::Error
impl From<std::io::Error> for RegistrarError {
    fn from(err: std::io::Error) -> Self {
        RegistrarError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RegistrarError {
    fn from(err: serde_json::Error) -> Self {
        RegistrarError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RegistrarError {
    fn from(err: toml::de::Error) -> Self {
        RegistrarError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registrar_error_display() {
        let err = RegistrarError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_remote_error_conversion() {
        let remote = RemoteError::ConnectionFailed("Network error".to_string());
        let err: RegistrarError = remote.into();
        assert!(matches!(err, RegistrarError::Remote(_)));
    }

    #[test]
    fn test_rate_limited_detection() {
        let err: RegistrarError = RemoteError::RateLimited {
            body: json!({"error": {"message": "slow down"}}),
        }
        .into();
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));

        let err: RegistrarError = RemoteError::RequestFailed {
            status: 400,
            body: json!({}),
        }
        .into();
        assert!(!err.is_rate_limited());
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_upload_aborted_keeps_original_status() {
        let original: RegistrarError = RemoteError::RequestFailed {
            status: 503,
            body: json!({"error": "unavailable"}),
        }
        .into();
        let err = RegistrarError::UploadAborted {
            blob_id: "blob_1".to_string(),
            source: Box::new(original),
        };

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("blob_1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_task_failed_display_counts_errors() {
        let err = RegistrarError::TaskFailed {
            message: "Your request was invalid".to_string(),
            errors: vec![json!({"index": 1}), json!({"index": 3})],
        };
        assert_eq!(
            err.to_string(),
            "Task failed: Your request was invalid (2 error(s))"
        );
    }

    #[test]
    fn test_interruption_detection() {
        assert!(RegistrarError::Cancelled("poll".to_string()).is_interruption());
        assert!(RegistrarError::DeadlineExceeded("poll".to_string()).is_interruption());
        assert!(!RegistrarError::Other("x".to_string()).is_interruption());
        assert!(RegistrarError::UploadAborted {
            blob_id: "blob_1".to_string(),
            source: Box::new(RegistrarError::Cancelled("upload part".to_string())),
        }
        .is_interruption());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RegistrarError = io_err.into();
        assert!(matches!(err, RegistrarError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: RegistrarError = toml_err.into();
        assert!(matches!(err, RegistrarError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
