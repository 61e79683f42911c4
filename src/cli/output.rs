//! Output formatting helpers for CLI commands

use crate::refresh::{DashboardSnapshot, PanelState};
use crate::registry::BackendConfig;
use crate::remote::{DiscoveredEndpoint, RemoteServer, ServerStatus};
use crate::session::UserIdentity;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

/// View model for backend display
#[derive(Debug, Clone, Serialize)]
pub struct BackendView {
    pub name: String,
    pub url: String,
    pub active: bool,
}

impl From<&BackendConfig> for BackendView {
    fn from(config: &BackendConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.base_url.clone(),
            active: config.is_active,
        }
    }
}

/// View model for remote server display
#[derive(Debug, Clone, Serialize)]
pub struct ServerView {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub status: ServerStatus,
    pub active: bool,
    pub retry_count: u32,
    pub last_checked: Option<String>,
    pub last_error: Option<String>,
}

impl From<&RemoteServer> for ServerView {
    fn from(server: &RemoteServer) -> Self {
        Self {
            id: server.id,
            name: server.name.clone(),
            url: server.base_url.clone(),
            status: server.status,
            active: server.is_active,
            retry_count: server.retry_count,
            last_checked: server.last_checked.clone(),
            last_error: server.last_error.clone(),
        }
    }
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Serialize `value` under `key` as pretty JSON
pub fn format_json<T: Serialize + ?Sized>(
    key: &str,
    value: &T,
) -> Result<String, serde_json::Error> {
    let mut wrapper = serde_json::Map::new();
    wrapper.insert(key.to_string(), serde_json::to_value(value)?);
    serde_json::to_string_pretty(&Value::Object(wrapper))
}

/// Format backends as a table
pub fn format_backends_table(backends: &[BackendView]) -> String {
    let mut table = table(vec!["Name", "URL", "Active"]);
    for b in backends {
        let active = if b.active {
            "✓".green().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![Cell::new(&b.name), Cell::new(&b.url), Cell::new(active)]);
    }
    table.to_string()
}

pub fn status_cell(status: ServerStatus) -> String {
    match status {
        ServerStatus::Online => "Online".green().to_string(),
        ServerStatus::Offline => "Offline".red().to_string(),
        ServerStatus::Error => "Error".red().bold().to_string(),
        ServerStatus::Unknown => "Unknown".yellow().to_string(),
    }
}

/// Format remote servers as a table
pub fn format_servers_table(servers: &[ServerView]) -> String {
    let mut table = table(vec![
        "ID",
        "Name",
        "URL",
        "Status",
        "Active",
        "Retries",
        "Last Checked",
        "Last Error",
    ]);
    for s in servers {
        table.add_row(vec![
            Cell::new(s.id),
            Cell::new(&s.name),
            Cell::new(&s.url),
            Cell::new(status_cell(s.status)),
            Cell::new(if s.active { "yes" } else { "no" }),
            Cell::new(s.retry_count),
            Cell::new(s.last_checked.as_deref().unwrap_or("-")),
            Cell::new(s.last_error.as_deref().unwrap_or("")),
        ]);
    }
    table.to_string()
}

/// Format discovered endpoints as a table
pub fn format_endpoints_table(endpoints: &[DiscoveredEndpoint]) -> String {
    let mut table = table(vec!["ID", "Method", "Path", "Health", "Status", "Response Time"]);
    for e in endpoints {
        let health = if e.health_status {
            "Healthy".green().to_string()
        } else {
            "Unhealthy".red().to_string()
        };
        table.add_row(vec![
            Cell::new(e.endpoint_id),
            Cell::new(&e.method),
            Cell::new(&e.path),
            Cell::new(health),
            Cell::new(e.status_code.map(|c| c.to_string()).unwrap_or_default()),
            Cell::new(
                e.response_time
                    .map(|t| format!("{:.0}ms", t))
                    .unwrap_or_default(),
            ),
        ]);
    }
    table.to_string()
}

pub fn format_identity(identity: &UserIdentity) -> String {
    format!(
        "{} <{}> ({})",
        identity.user_name.bold(),
        identity.user_email,
        identity.user_role
    )
}

/// One-line description of a panel payload.
fn summarize(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("{} item(s)", items.len()),
        Value::Object(map) => {
            let list = ["items", "data", "endpoints", "results"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array));
            let total = map.get("total").and_then(Value::as_u64);
            match (list, total) {
                (Some(items), Some(total)) => format!("{} of {} item(s)", items.len(), total),
                (Some(items), None) => format!("{} item(s)", items.len()),
                _ => {
                    let mut keys: Vec<&str> = map.keys().map(String::as_str).take(4).collect();
                    if map.len() > keys.len() {
                        keys.push("…");
                    }
                    keys.join(", ")
                }
            }
        }
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Format the dashboard panels as a table
pub fn format_dashboard_table(snapshot: &DashboardSnapshot) -> String {
    let mut table = table(vec!["Panel", "State", "Summary"]);
    for (source, state) in &snapshot.panels {
        let (state_str, summary) = match state {
            PanelState::Loaded(value) => ("Loaded".green().to_string(), summarize(value)),
            PanelState::Failed(message) => ("Failed".red().to_string(), message.clone()),
        };
        table.add_row(vec![
            Cell::new(source.to_string()),
            Cell::new(state_str),
            Cell::new(summary),
        ]);
    }

    let mut out = table.to_string();
    out.push_str(&format!("\nAttack list page: {}", snapshot.attack_page));
    if let Some(at) = snapshot.refreshed_at {
        out.push_str(&format!("\nRefreshed: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(error) = &snapshot.error {
        out.push_str(&format!("\n{} {}", "Error:".red().bold(), error));
    }
    out
}

pub fn format_dashboard_json(snapshot: &DashboardSnapshot) -> Result<String, serde_json::Error> {
    format_json("dashboard", snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::DashboardSource;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn server_view(status: ServerStatus) -> ServerView {
        ServerView {
            id: 5,
            name: "edge-01".to_string(),
            url: "http://10.0.0.5:9000".to_string(),
            status,
            active: true,
            retry_count: 0,
            last_checked: None,
            last_error: None,
        }
    }

    #[test]
    fn test_format_backends_table_empty() {
        let output = format_backends_table(&[]);
        assert!(output.contains("Name"));
    }

    #[test]
    fn test_format_backends_table_with_data() {
        let output = format_backends_table(&[BackendView {
            name: "prod".into(),
            url: "https://api.example.com".into(),
            active: true,
        }]);
        assert!(output.contains("prod"));
        assert!(output.contains("https://api.example.com"));
    }

    #[test]
    fn test_format_servers_table_with_data() {
        let output = format_servers_table(&[server_view(ServerStatus::Offline)]);
        assert!(output.contains("edge-01"));
        assert!(output.contains("Offline"));
    }

    #[test]
    fn test_format_json_wraps_under_key() {
        let output = format_json("servers", &[server_view(ServerStatus::Online)]).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["servers"][0]["status"], "online");
        assert_eq!(parsed["servers"][0]["id"], 5);
    }

    #[test]
    fn test_summarize_shapes() {
        assert_eq!(summarize(&json!([1, 2, 3])), "3 item(s)");
        assert_eq!(
            summarize(&json!({"items": [1, 2], "total": 40})),
            "2 of 40 item(s)"
        );
        assert_eq!(summarize(&json!({"score": 7})), "score");
        assert_eq!(summarize(&Value::Null), "-");
    }

    #[test]
    fn test_format_dashboard_table_shows_failures() {
        let mut panels = BTreeMap::new();
        panels.insert(DashboardSource::ThreatScores, PanelState::Loaded(json!({"score": 3})));
        panels.insert(
            DashboardSource::ThreatTrends,
            PanelState::Failed("The server encountered an error (500). Please try again.".into()),
        );
        let snapshot = DashboardSnapshot {
            panels,
            error: Some("The server encountered an error (500). Please try again.".into()),
            attack_page: 2,
            refreshed_at: None,
        };

        let output = format_dashboard_table(&snapshot);
        assert!(output.contains("threat_scores"));
        assert!(output.contains("Failed"));
        assert!(output.contains("Attack list page: 2"));
    }
}
