//! Classification of a single network attempt.

use reqwest::header::HeaderMap;

/// Raw successful response, before decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Result of one attempt; drives the executor's retry decision.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Success(RawResponse),
    Timeout,
    HttpError { status: u16, body: String },
    NetworkError(String),
}

impl RequestOutcome {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestOutcome::Timeout | RequestOutcome::NetworkError(_)
        )
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            RequestOutcome::Success(_) => "success",
            RequestOutcome::Timeout => "timeout",
            RequestOutcome::HttpError { status, .. } if *status == 401 => "unauthorized",
            RequestOutcome::HttpError { .. } => "http_error",
            RequestOutcome::NetworkError(_) => "network_error",
        }
    }
}
