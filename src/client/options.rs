//! Per-call request options and bodies.

use super::ApiError;
use crate::config::ClientConfig;
use serde::Serialize;
use std::time::Duration;

/// How a successful response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Json,
    /// Raw bytes plus the `Content-Disposition` filename (CSV exports).
    Binary,
}

/// Resilience and credential knobs for one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub response: ResponseKind,
    /// Filename for a binary response that names none.
    pub download_name: Option<String>,
    /// Send no credential headers or cookies (login).
    pub anonymous: bool,
    /// Treat a 401 as session expiry and clear credentials.
    pub intercept_unauthorized: bool,
}

impl From<&ClientConfig> for RequestOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            response: ResponseKind::Json,
            download_name: None,
            anonymous: false,
            intercept_unauthorized: true,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn binary(mut self) -> Self {
        self.response = ResponseKind::Binary;
        self
    }

    /// Binary response saved as `name` unless `Content-Disposition` says
    /// otherwise.
    pub fn binary_named(mut self, name: impl Into<String>) -> Self {
        self.response = ResponseKind::Binary;
        self.download_name = Some(name.into());
        self
    }

    /// No credentials are attached and a 401 is reported as a plain
    /// `Http` error instead of expiring the session.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self.intercept_unauthorized = false;
        self
    }

    /// A 401 is reported as a plain `Http` error; the session is untouched.
    pub fn without_auth_interception(mut self) -> Self {
        self.intercept_unauthorized = false;
        self
    }
}

/// Request body encodings the backend accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded`, used by the token endpoint.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Validation(e.to_string()))
    }

    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
