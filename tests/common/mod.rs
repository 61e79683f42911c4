//! Shared test utilities for Watchtower integration tests.
//!
//! Builds a full client stack (store, registry, credentials, executor) pointed
//! at a wiremock server, plus helpers for the endpoints most tests need.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use watchtower::client::{RequestExecutor, RequestOptions};
use watchtower::credentials::{CredentialStore, TokenSet};
use watchtower::registry::{BackendConfig, BackendRegistry};
use watchtower::session::SessionSignal;
use watchtower::storage::MemoryStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestStack {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<BackendRegistry>,
    pub credentials: Arc<CredentialStore>,
    pub signal: Arc<SessionSignal>,
    pub executor: Arc<RequestExecutor>,
}

/// Options with millisecond-scale timeouts so retry tests stay fast.
pub fn fast_options() -> RequestOptions {
    RequestOptions::default()
        .with_timeout(Duration::from_secs(2))
        .with_max_retries(3)
        .with_retry_delay(Duration::from_millis(10))
}

/// Start a mock backend and wire a client stack against it.
pub async fn stack() -> TestStack {
    stack_with(fast_options()).await
}

pub async fn stack_with(options: RequestOptions) -> TestStack {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    let registry = Arc::new(BackendRegistry::new(
        store.clone(),
        "http://localhost:8000".parse().unwrap(),
    ));
    registry
        .add(BackendConfig::new("mock", server.uri()))
        .unwrap();

    let credentials = Arc::new(CredentialStore::new(store.clone()));
    let signal = Arc::new(SessionSignal::new());
    let executor = Arc::new(RequestExecutor::new(
        registry.clone(),
        credentials.clone(),
        signal.clone(),
        options,
    ));

    TestStack {
        server,
        store,
        registry,
        credentials,
        signal,
        executor,
    }
}

/// Store the canonical `t1`/`k1`/`c1` session.
pub fn log_in(stack: &TestStack) {
    stack
        .credentials
        .set(
            &TokenSet {
                bearer_token: "t1".to_string(),
                api_key: Some("k1".to_string()),
                csrf_token: Some("c1".to_string()),
            },
            false,
        )
        .unwrap();
}

/// Serve `GET /csrf/csrf-token` with both a cookie and a body token.
pub async fn mount_csrf(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/csrf/csrf-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "set-cookie",
                    format!("csrf_token={}; Path=/; SameSite=Strict", token).as_str(),
                )
                .set_body_json(serde_json::json!({ "csrf_token": token })),
        )
        .mount(server)
        .await;
}

pub fn user_json() -> serde_json::Value {
    serde_json::json!({
        "user_id": 1,
        "user_name": "admin",
        "user_email": "admin@example.com",
        "user_role": "Admin",
        "api_key": "k1"
    })
}

pub fn server_json(id: i64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "base_url": format!("http://10.0.0.{}:9000", id),
        "description": null,
        "auth_type": "basic",
        "status": "online",
        "retry_count": 0,
        "last_checked": "2024-05-01T10:00:00",
        "last_error": null,
        "is_active": true,
        "created_at": "2024-04-01T09:00:00",
        "updated_at": "2024-04-01T09:00:00",
        "created_by": 1
    })
}

/// Number of requests the mock received for `path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
