//! Remote server registry.
//!
//! Cached view of the monitored servers behind `/remote-servers`. The cache
//! only changes after the backend confirms a mutation.

mod types;

pub use types::*;

use crate::client::{ApiError, RequestBody, RequestExecutor};
use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const BASE_PATH: &str = "/remote-servers";

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

pub struct RemoteServerRegistry {
    executor: Arc<RequestExecutor>,
    servers: RwLock<Vec<RemoteServer>>,
}

impl RemoteServerRegistry {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            servers: RwLock::new(Vec::new()),
        }
    }

    /// Cached servers, in backend order.
    pub fn servers(&self) -> Vec<RemoteServer> {
        self.servers.read().clone()
    }

    pub fn get(&self, id: i64) -> Option<RemoteServer> {
        self.servers.read().iter().find(|s| s.id == id).cloned()
    }

    /// Reload the list from the backend.
    pub async fn refresh(&self) -> Result<Vec<RemoteServer>, ApiError> {
        let servers: Vec<RemoteServer> = self.executor.get_json(BASE_PATH).await?;
        tracing::debug!(count = servers.len(), "Remote servers loaded");
        *self.servers.write() = servers.clone();
        Ok(servers)
    }

    /// Fetch one server and update its cache entry.
    pub async fn fetch(&self, id: i64) -> Result<RemoteServer, ApiError> {
        let server: RemoteServer = self.executor.get_json(&server_path(id, "")).await?;
        self.upsert(server.clone());
        Ok(server)
    }

    pub async fn add(&self, input: &RemoteServerInput) -> Result<RemoteServer, ApiError> {
        let missing = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        if missing(&input.name) {
            return Err(ApiError::Validation("server name is required".into()));
        }
        if missing(&input.base_url) {
            return Err(ApiError::Validation("server base_url is required".into()));
        }

        let server: RemoteServer = self
            .mutate(Method::POST, BASE_PATH, Some(RequestBody::json(input)?))
            .await?;
        tracing::info!(id = server.id, name = %server.name, "Remote server added");
        self.servers.write().push(server.clone());
        Ok(server)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &RemoteServerInput,
    ) -> Result<RemoteServer, ApiError> {
        let server: RemoteServer = self
            .mutate(Method::PUT, &server_path(id, ""), Some(RequestBody::json(input)?))
            .await?;
        tracing::info!(id, "Remote server updated");
        self.upsert(server.clone());
        Ok(server)
    }

    /// Delete on the backend, then drop the cache entry.
    ///
    /// On failure the cached record is left in place.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.mutate::<serde_json::Value>(Method::DELETE, &server_path(id, ""), None)
            .await?;
        tracing::info!(id, "Remote server deleted");
        self.servers.write().retain(|s| s.id != id);
        Ok(())
    }

    /// Probe the server now and merge the result into the cache.
    pub async fn check_status(&self, id: i64) -> Result<StatusCheck, ApiError> {
        let check: StatusCheck = self
            .mutate(Method::POST, &server_path(id, "/check-status"), None)
            .await?;
        tracing::debug!(id, status = ?check.status, "Remote server status checked");
        if let Some(server) = self.servers.write().iter_mut().find(|s| s.id == id) {
            server.merge_status(&check);
        }
        Ok(check)
    }

    /// Kick off endpoint discovery. Progress is observed with
    /// [`poll_discovery`](Self::poll_discovery).
    pub async fn run_discovery(&self, id: i64) -> Result<String, ApiError> {
        let response: serde_json::Value = self
            .mutate(Method::POST, &server_path(id, "/discover"), None)
            .await?;
        tracing::info!(id, "Endpoint discovery started");
        Ok(response
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn discovered_count(&self, id: i64) -> Result<u64, ApiError> {
        let response: CountResponse = self
            .executor
            .get_json(&server_path(id, "/discovered-endpoints/count"))
            .await?;
        Ok(response.count)
    }

    /// Poll the discovered-endpoint count until it is non-zero and unchanged
    /// between two polls, or `max_polls` is spent. Returns the last count.
    pub async fn poll_discovery(
        &self,
        id: i64,
        interval: Duration,
        max_polls: u32,
    ) -> Result<u64, ApiError> {
        let mut previous = None;
        for poll in 1..=max_polls {
            let count = self.discovered_count(id).await?;
            tracing::debug!(id, poll, count, "Discovery poll");
            if count > 0 && previous == Some(count) {
                return Ok(count);
            }
            previous = Some(count);
            if poll < max_polls {
                tokio::time::sleep(interval).await;
            }
        }
        Ok(previous.unwrap_or(0))
    }

    pub async fn discovered_endpoints(&self, id: i64) -> Result<Vec<DiscoveredEndpoint>, ApiError> {
        self.executor
            .get_json(&server_path(id, "/discovered-endpoints"))
            .await
    }

    pub async fn run_health_scan(&self, id: i64) -> Result<HealthScanReport, ApiError> {
        self.mutate(Method::POST, &server_path(id, "/run-health-scan"), None)
            .await
    }

    /// Fresh CSRF token, then the mutating request.
    async fn mutate<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T, ApiError> {
        self.executor.refresh_csrf().await?;
        self.executor.request(method, path, body).await
    }

    fn upsert(&self, server: RemoteServer) {
        let mut servers = self.servers.write();
        match servers.iter_mut().find(|s| s.id == server.id) {
            Some(existing) => *existing = server,
            None => servers.push(server),
        }
    }
}

fn server_path(id: i64, suffix: &str) -> String {
    format!("{}/{}{}", BASE_PATH, id, suffix)
}
