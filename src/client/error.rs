//! Normalized error taxonomy for every backend call.

use crate::registry::RegistryError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the request executor and everything built on it.
///
/// No transport-level error type crosses the executor boundary; callers only
/// ever see one of these variants.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Every attempt exceeded the per-attempt deadline.
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// Connection-level failure (DNS, refused, reset, CSRF unavailable).
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-401 error status.
    #[error("backend error {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Backend answered 401; the session has been cleared.
    #[error("session expired, please log in again")]
    AuthExpired,

    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Request could not be built from local input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Timeouts and connection failures are transient; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Network(_))
    }

    /// Whether the UI should send the user back to the login view.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::AuthExpired => Some(401),
            _ => None,
        }
    }

    /// Message suitable for an inline error banner.
    ///
    /// Client errors show the backend's `detail`; server errors are generic.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { status, detail } if (400..500).contains(status) => detail.clone(),
            ApiError::Http { status, .. } => {
                format!("The server encountered an error ({}). Please try again.", status)
            }
            ApiError::Timeout { .. } => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and retry.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Uses the `detail` field when the body is a JSON object carrying one,
/// otherwise the raw text.
pub fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}
