use serde::{Deserialize, Serialize};
use std::fmt;

/// How the monitored server authenticates our health probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    Basic,
    Token,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Basic => f.write_str("basic"),
            AuthType::Token => f.write_str("token"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Offline,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
            ServerStatus::Error => "error",
            ServerStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

fn default_true() -> bool {
    true
}

/// A monitored remote server as returned by `/remote-servers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteServer {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub health_check_url: Option<String>,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_checked: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
}

impl RemoteServer {
    /// Apply a status check result. Fields absent from the check are kept.
    pub fn merge_status(&mut self, check: &StatusCheck) {
        if let Some(status) = check.status {
            self.status = status;
        }
        if check.last_checked.is_some() {
            self.last_checked = check.last_checked.clone();
        }
        if let Some(error) = &check.last_error {
            self.last_error = Some(error.clone());
        }
        if let Some(retry_count) = check.retry_count {
            self.retry_count = retry_count;
        }
    }
}

/// Fields sent on create and update; `None` fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteServerInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl RemoteServerInput {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }
}

/// Body of `POST /remote-servers/{id}/check-status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusCheck {
    #[serde(default)]
    pub status: Option<ServerStatus>,
    #[serde(default)]
    pub last_checked: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub retry_count: Option<u32>,
}

/// An endpoint found by discovery on a remote server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredEndpoint {
    pub endpoint_id: i64,
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_checked: Option<String>,
    #[serde(default = "default_true")]
    pub health_status: bool,
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result of `POST /remote-servers/{id}/run-health-scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScanReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}
