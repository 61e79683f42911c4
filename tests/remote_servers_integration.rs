//! Remote server registry against a mock backend.

mod common;

use common::{hits, log_in, mount_csrf, server_json, stack};
use std::time::Duration;
use watchtower::client::ApiError;
use watchtower::remote::{RemoteServerInput, RemoteServerRegistry, ServerStatus};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_list(server: &MockServer, servers: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/remote-servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_refresh_loads_servers() {
    let stack = stack().await;
    log_in(&stack);
    mount_list(
        &stack.server,
        serde_json::json!([server_json(5, "edge-01"), server_json(6, "edge-02")]),
    )
    .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let servers = registry.refresh().await.unwrap();

    assert_eq!(servers.len(), 2);
    assert_eq!(registry.get(6).unwrap().name, "edge-02");
    assert_eq!(registry.get(5).unwrap().status, ServerStatus::Online);
}

#[tokio::test]
async fn test_failed_delete_keeps_cached_record() {
    let stack = stack().await;
    log_in(&stack);
    mount_list(&stack.server, serde_json::json!([server_json(5, "edge-01")])).await;
    mount_csrf(&stack.server, "c2").await;
    Mock::given(method("DELETE"))
        .and(path("/remote-servers/5"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail": "Remote server not found"})),
        )
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    registry.refresh().await.unwrap();

    let err = registry.delete(5).await.unwrap_err();
    assert_eq!(err.user_message(), "Remote server not found");
    assert!(registry.get(5).is_some());
}

#[tokio::test]
async fn test_delete_removes_cached_record() {
    let stack = stack().await;
    log_in(&stack);
    mount_list(
        &stack.server,
        serde_json::json!([server_json(5, "edge-01"), server_json(6, "edge-02")]),
    )
    .await;
    mount_csrf(&stack.server, "c2").await;
    Mock::given(method("DELETE"))
        .and(path("/remote-servers/5"))
        .and(header("x-csrf-token", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "deleted"})))
        .expect(1)
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    registry.refresh().await.unwrap();
    registry.delete(5).await.unwrap();

    assert!(registry.get(5).is_none());
    assert_eq!(registry.servers().len(), 1);
}

#[tokio::test]
async fn test_add_refreshes_csrf_and_caches() {
    let stack = stack().await;
    log_in(&stack);
    mount_csrf(&stack.server, "c3").await;
    Mock::given(method("POST"))
        .and(path("/remote-servers"))
        .and(header("x-csrf-token", "c3"))
        .and(body_partial_json(serde_json::json!({
            "name": "edge-07",
            "base_url": "http://10.0.0.7:9000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_json(7, "edge-07")))
        .expect(1)
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let server = registry
        .add(&RemoteServerInput::new("edge-07", "http://10.0.0.7:9000"))
        .await
        .unwrap();

    assert_eq!(server.id, 7);
    assert_eq!(registry.get(7).unwrap().name, "edge-07");
    assert_eq!(hits(&stack.server, "/csrf/csrf-token").await, 1);
}

#[tokio::test]
async fn test_add_validation_makes_no_request() {
    let stack = stack().await;
    log_in(&stack);

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let err = registry
        .add(&RemoteServerInput::new("  ", "http://10.0.0.7:9000"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(stack.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_replaces_cached_record() {
    let stack = stack().await;
    log_in(&stack);
    mount_list(&stack.server, serde_json::json!([server_json(5, "edge-01")])).await;
    mount_csrf(&stack.server, "c2").await;
    Mock::given(method("PUT"))
        .and(path("/remote-servers/5"))
        .and(body_partial_json(serde_json::json!({"name": "edge-renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_json(5, "edge-renamed")))
        .expect(1)
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    registry.refresh().await.unwrap();

    let input = RemoteServerInput {
        name: Some("edge-renamed".into()),
        ..Default::default()
    };
    registry.update(5, &input).await.unwrap();

    assert_eq!(registry.servers().len(), 1);
    assert_eq!(registry.get(5).unwrap().name, "edge-renamed");
}

#[tokio::test]
async fn test_check_status_merges_into_cache() {
    let stack = stack().await;
    log_in(&stack);
    mount_list(&stack.server, serde_json::json!([server_json(5, "edge-01")])).await;
    mount_csrf(&stack.server, "c2").await;
    Mock::given(method("POST"))
        .and(path("/remote-servers/5/check-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "offline",
            "last_checked": "2024-05-02T08:30:00",
            "last_error": "connection refused",
            "retry_count": 2
        })))
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    registry.refresh().await.unwrap();
    let check = registry.check_status(5).await.unwrap();

    assert_eq!(check.status, Some(ServerStatus::Offline));
    let cached = registry.get(5).unwrap();
    assert_eq!(cached.status, ServerStatus::Offline);
    assert_eq!(cached.retry_count, 2);
    assert_eq!(cached.last_error.as_deref(), Some("connection refused"));
    assert_eq!(cached.name, "edge-01");
}

#[tokio::test]
async fn test_poll_discovery_waits_for_stable_count() {
    let stack = stack().await;
    log_in(&stack);
    Mock::given(method("GET"))
        .and(path("/remote-servers/5/discovered-endpoints/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 0})))
        .up_to_n_times(1)
        .mount(&stack.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/remote-servers/5/discovered-endpoints/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 3})))
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let count = registry
        .poll_discovery(5, Duration::from_millis(10), 15)
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        hits(&stack.server, "/remote-servers/5/discovered-endpoints/count").await,
        3
    );
}

#[tokio::test]
async fn test_poll_discovery_stops_at_budget() {
    let stack = stack().await;
    log_in(&stack);
    Mock::given(method("GET"))
        .and(path("/remote-servers/5/discovered-endpoints/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 0})))
        .expect(4)
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let count = registry
        .poll_discovery(5, Duration::from_millis(5), 4)
        .await
        .unwrap();

    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_discovery_and_endpoints() {
    let stack = stack().await;
    log_in(&stack);
    mount_csrf(&stack.server, "c2").await;
    Mock::given(method("POST"))
        .and(path("/remote-servers/5/discover"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"message": "Endpoint discovery started"}),
        ))
        .expect(1)
        .mount(&stack.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/remote-servers/5/discovered-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"endpoint_id": 1, "path": "/health", "method": "GET", "status_code": 200, "response_time": 12.5},
            {"endpoint_id": 2, "path": "/login", "method": "POST", "health_status": false}
        ])))
        .mount(&stack.server)
        .await;

    let registry = RemoteServerRegistry::new(stack.executor.clone());
    let message = registry.run_discovery(5).await.unwrap();
    assert_eq!(message, "Endpoint discovery started");

    let endpoints = registry.discovered_endpoints(5).await.unwrap();
    assert_eq!(endpoints.len(), 2);
    assert!(endpoints[0].health_status);
    assert!(!endpoints[1].health_status);
    assert_eq!(endpoints[0].status_code, Some(200));
}
