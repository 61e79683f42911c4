//! Request executor.
//!
//! Every backend call goes through [`RequestExecutor`]: it resolves the active
//! backend, attaches credentials, enforces the per-attempt deadline, retries
//! transient failures and intercepts 401s so the session is torn down in one
//! place.

mod download;
mod error;
mod options;
mod outcome;

pub use download::*;
pub use error::*;
pub use options::*;
pub use outcome::*;

use crate::credentials::{CredentialSnapshot, CredentialStore, API_KEY_HEADER, CSRF_HEADER};
use crate::registry::BackendRegistry;
use crate::session::SessionSignal;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Binary(Download),
}

impl Payload {
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Binary(_) => Err(ApiError::Decode("expected JSON, got binary".into())),
        }
    }

    pub fn into_download(self) -> Result<Download, ApiError> {
        match self {
            Payload::Binary(download) => Ok(download),
            Payload::Json(_) => Err(ApiError::Decode("expected binary, got JSON".into())),
        }
    }
}

/// POST, PUT, PATCH and DELETE carry the CSRF header.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Single entry point for backend HTTP calls.
pub struct RequestExecutor {
    client: reqwest::Client,
    registry: Arc<BackendRegistry>,
    credentials: Arc<CredentialStore>,
    session: Arc<SessionSignal>,
    defaults: RequestOptions,
}

impl RequestExecutor {
    pub fn new(
        registry: Arc<BackendRegistry>,
        credentials: Arc<CredentialStore>,
        session: Arc<SessionSignal>,
        defaults: RequestOptions,
    ) -> Self {
        Self::with_client(registry, credentials, session, defaults, reqwest::Client::new())
    }

    /// Create an executor with a custom HTTP client (for testing).
    pub fn with_client(
        registry: Arc<BackendRegistry>,
        credentials: Arc<CredentialStore>,
        session: Arc<SessionSignal>,
        defaults: RequestOptions,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            registry,
            credentials,
            session,
            defaults,
        }
    }

    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn session(&self) -> &Arc<SessionSignal> {
        &self.session
    }

    /// Execute one logical request.
    ///
    /// Mutating requests without a CSRF cookie fetch one first; if that
    /// fails the request itself is never sent.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: &RequestOptions,
    ) -> Result<Payload, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("api_request", %request_id, %method, path);

        async {
            if is_mutating(&method) && !options.anonymous {
                let secure = self.registry.get_active().is_secure();
                if self.credentials.csrf_token_for(secure).is_none() {
                    tracing::debug!("No sendable CSRF cookie, fetching one before mutating request");
                    self.credentials.refresh_csrf(self).await?;
                }
            }
            self.dispatch(method, path, body, options).await
        }
        .instrument(span)
        .await
    }

    /// Retry loop without the CSRF pre-fetch.
    pub(crate) async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: &RequestOptions,
    ) -> Result<Payload, ApiError> {
        let backend = self.registry.get_active();
        let url = backend.url_for(path)?;
        let secure = backend.is_secure();
        let snapshot = self.credentials.snapshot(secure);

        if is_mutating(&method) && !options.anonymous && snapshot.credentials.csrf_token.is_none()
        {
            return Err(ApiError::Network("CSRF token unavailable".into()));
        }

        let started = Instant::now();
        let max_attempts = options.max_retries + 1;
        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            let outcome = self
                .attempt(&method, &url, body.as_ref(), options, &snapshot, secure)
                .await;
            tracing::debug!(attempt = attempts, outcome = outcome.label(), "Attempt finished");

            if outcome.is_retryable() && attempts < max_attempts {
                tracing::warn!(
                    attempt = attempts,
                    max_attempts,
                    outcome = outcome.label(),
                    delay_ms = options.retry_delay.as_millis() as u64,
                    "Transient failure, retrying"
                );
                metrics::counter!("watchtower_request_retries_total",
                    "method" => method.to_string()
                )
                .increment(1);
                tokio::time::sleep(options.retry_delay).await;
                continue;
            }
            break outcome;
        };

        metrics::counter!("watchtower_requests_total",
            "method" => method.to_string(),
            "outcome" => outcome.label()
        )
        .increment(1);
        metrics::histogram!("watchtower_request_duration_seconds",
            "method" => method.to_string()
        )
        .record(started.elapsed().as_secs_f64());

        match outcome {
            RequestOutcome::Success(raw) => decode_payload(raw, options, path),
            RequestOutcome::Timeout => Err(ApiError::Timeout { attempts }),
            RequestOutcome::NetworkError(e) => Err(ApiError::Network(e)),
            RequestOutcome::HttpError { status: 401, .. } if options.intercept_unauthorized => {
                self.handle_unauthorized(snapshot.generation);
                Err(ApiError::AuthExpired)
            }
            RequestOutcome::HttpError { status, body } => Err(ApiError::Http {
                status,
                detail: extract_detail(&body),
            }),
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&RequestBody>,
        options: &RequestOptions,
        snapshot: &CredentialSnapshot,
        secure: bool,
    ) -> RequestOutcome {
        let mut request = self.client.request(method.clone(), url.clone());
        request = match body {
            Some(RequestBody::Json(value)) => request.json(value),
            Some(RequestBody::Form(pairs)) => request.form(pairs),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        if !options.anonymous {
            let credentials = &snapshot.credentials;
            if let Some(token) = &credentials.bearer_token {
                request = request.bearer_auth(token);
            }
            if let Some(key) = &credentials.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            if is_mutating(method) {
                if let Some(csrf) = &credentials.csrf_token {
                    request = request.header(CSRF_HEADER, csrf);
                }
            }
            if let Some(cookies) = &snapshot.cookie_header {
                request = request.header(COOKIE, cookies);
            }
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        match tokio::time::timeout(options.timeout, exchange).await {
            Err(_) => RequestOutcome::Timeout,
            Ok(Err(e)) if e.is_timeout() => RequestOutcome::Timeout,
            Ok(Err(e)) => RequestOutcome::NetworkError(e.to_string()),
            Ok(Ok((status, headers, body))) => {
                for value in headers.get_all(SET_COOKIE) {
                    if let Ok(raw) = value.to_str() {
                        self.credentials.absorb_set_cookie(raw, secure);
                    }
                }
                if status >= 400 {
                    RequestOutcome::HttpError {
                        status,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    }
                } else {
                    RequestOutcome::Success(RawResponse {
                        status,
                        headers,
                        body: body.to_vec(),
                    })
                }
            }
        }
    }

    /// Tear the session down once per credential generation.
    fn handle_unauthorized(&self, generation: u64) {
        if self.credentials.expire(generation) {
            tracing::warn!(generation, "Backend returned 401, session cleared");
            self.session.expire();
        } else {
            tracing::debug!(generation, "401 for an already-cleared session");
        }
    }

    /// Execute with default options and deserialize the JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T, ApiError> {
        let value = self
            .execute(method, path, body, &self.defaults)
            .await?
            .into_json()?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    /// GET a binary export.
    pub async fn download(&self, path: &str) -> Result<Download, ApiError> {
        self.fetch_download(path, self.defaults.clone().binary()).await
    }

    /// GET a binary export, named `fallback` when the response sends no
    /// filename.
    pub async fn download_as(&self, path: &str, fallback: &str) -> Result<Download, ApiError> {
        self.fetch_download(path, self.defaults.clone().binary_named(fallback))
            .await
    }

    async fn fetch_download(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Download, ApiError> {
        self.execute(Method::GET, path, None, &options)
            .await?
            .into_download()
    }

    /// Fetch a fresh CSRF token from the active backend.
    pub async fn refresh_csrf(&self) -> Result<String, ApiError> {
        self.credentials.refresh_csrf(self).await
    }
}

fn decode_payload(
    raw: RawResponse,
    options: &RequestOptions,
    path: &str,
) -> Result<Payload, ApiError> {
    match options.response {
        ResponseKind::Binary => {
            let fallback = options
                .download_name
                .clone()
                .unwrap_or_else(|| fallback_filename(path));
            Ok(Payload::Binary(Download::from_response(raw, &fallback)))
        }
        ResponseKind::Json if raw.body.iter().all(u8::is_ascii_whitespace) => {
            Ok(Payload::Json(Value::Null))
        }
        ResponseKind::Json => serde_json::from_slice(&raw.body)
            .map(Payload::Json)
            .map_err(|e| ApiError::Decode(e.to_string())),
    }
}

fn fallback_filename(path: &str) -> String {
    path.split('?')
        .next()
        .unwrap_or_default()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    fn raw(body: &[u8]) -> RawResponse {
        RawResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_mutating_methods() {
        assert!(is_mutating(&Method::POST));
        assert!(is_mutating(&Method::PUT));
        assert!(is_mutating(&Method::PATCH));
        assert!(is_mutating(&Method::DELETE));
        assert!(!is_mutating(&Method::GET));
        assert!(!is_mutating(&Method::HEAD));
    }

    #[test]
    fn test_empty_body_decodes_to_null() {
        let payload = decode_payload(raw(b""), &RequestOptions::default(), "/x").unwrap();
        assert_eq!(payload, Payload::Json(Value::Null));
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let err = decode_payload(raw(b"<html>"), &RequestOptions::default(), "/x").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_binary_uses_path_fallback() {
        let options = RequestOptions::default().binary();
        let payload =
            decode_payload(raw(b"a,b"), &options, "/security/export-threat-logs").unwrap();
        let download = payload.into_download().unwrap();
        assert_eq!(download.filename, "export-threat-logs");
        assert_eq!(download.bytes, b"a,b");
    }

    #[test]
    fn test_binary_named_overrides_path_fallback() {
        let options = RequestOptions::default().binary_named("api_logs.csv");
        let download = decode_payload(raw(b"a,b"), &options, "/analytics/export-logs")
            .unwrap()
            .into_download()
            .unwrap();
        assert_eq!(download.filename, "api_logs.csv");
    }

    #[test]
    fn test_fallback_filename_edge_cases() {
        assert_eq!(fallback_filename("/analytics/export-logs?x=1"), "export-logs");
        assert_eq!(fallback_filename("/"), "download");
    }
}
