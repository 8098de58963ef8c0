//! Transport trait and response classification
//!
//! A `Transport` performs one authenticated request and classifies the
//! response. It never retries; retry policy lives in
//! [`crate::core::backoff`].

use crate::domain::{RegistrarError, RemoteError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Query parameters for a GET request
pub type Query = [(String, String)];

/// Request/response transport to the registry API
///
/// Paths are relative to the API base URL (`blobs`, `tasks/{id}`, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request
    ///
    /// # Errors
    ///
    /// `RateLimited` on 429, `RequestFailed` on any other status >= 400,
    /// `ConnectionFailed` when the server cannot be reached.
    async fn get(&self, path: &str, query: &Query) -> Result<Value>;

    /// Issue a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Same classification as [`Transport::get`].
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;
}

/// Classify a raw HTTP response
///
/// - status < 400: the body parsed as JSON (an empty body reads as `{}`)
/// - status 429: `RateLimited` with the parsed body
/// - status >= 400: `RequestFailed { status, body }`
///
/// Error bodies that are not JSON are kept as a JSON string so diagnostics
/// still carry them.
pub fn classify_response(status: u16, body: &str) -> Result<Value> {
    if status < 400 {
        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        return serde_json::from_str(body).map_err(|e| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "status {status} with unparseable body: {e}"
            )))
        });
    }

    let parsed = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));

    if status == 429 {
        Err(RemoteError::RateLimited { body: parsed }.into())
    } else {
        Err(RemoteError::RequestFailed {
            status,
            body: parsed,
        }
        .into())
    }
}

/// Join a relative API path onto a base URL
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_success_parses_body() {
        let value = classify_response(200, r#"{"id": "blob_1"}"#).unwrap();
        assert_eq!(value, json!({"id": "blob_1"}));
    }

    #[test]
    fn test_success_empty_body_is_empty_object() {
        let value = classify_response(204, "").unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_success_invalid_json() {
        let err = classify_response(200, "<html>").unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Remote(RemoteError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_rate_limited() {
        let err = classify_response(429, r#"{"error": {"type": "rate_limit"}}"#).unwrap_err();
        match err {
            RegistrarError::Remote(RemoteError::RateLimited { body }) => {
                assert_eq!(body["error"]["type"], "rate_limit");
            }
            other => panic!("Expected RateLimited, got {other:?}"),
        }
    }

    #[test_case(400 ; "bad request")]
    #[test_case(404 ; "not found")]
    #[test_case(500 ; "server error")]
    #[test_case(503 ; "unavailable")]
    fn test_request_failed(status: u16) {
        let err = classify_response(status, r#"{"error": {"message": "nope"}}"#).unwrap_err();
        match err {
            RegistrarError::Remote(RemoteError::RequestFailed { status: s, body }) => {
                assert_eq!(s, status);
                assert_eq!(body["error"]["message"], "nope");
            }
            other => panic!("Expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_error_body_not_json_is_kept_as_string() {
        let err = classify_response(502, "Bad Gateway").unwrap_err();
        match err {
            RegistrarError::Remote(RemoteError::RequestFailed { body, .. }) => {
                assert_eq!(body, json!("Bad Gateway"));
            }
            other => panic!("Expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://x.benchling.com/api/v2/", "/blobs"),
            "https://x.benchling.com/api/v2/blobs"
        );
        assert_eq!(
            join_url("https://x.benchling.com/api/v2", "tasks/t1"),
            "https://x.benchling.com/api/v2/tasks/t1"
        );
    }
}
