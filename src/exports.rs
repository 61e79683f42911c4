//! CSV log exports.

use crate::client::{ApiError, Download, RequestExecutor};
use std::fmt;

/// Log exports the backend can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    ThreatLogs,
    TrafficLogs,
    RequestLogs,
    /// Health-check history of one remote server.
    ServerHealthLogs(i64),
}

impl ExportKind {
    pub fn path(&self) -> String {
        match self {
            ExportKind::ThreatLogs => "/security/export-threat-logs".to_string(),
            ExportKind::TrafficLogs => "/security/export-traffic-logs".to_string(),
            ExportKind::RequestLogs => "/analytics/export-logs".to_string(),
            ExportKind::ServerHealthLogs(id) => {
                format!("/analytics/remote-servers/{}/export-health-logs", id)
            }
        }
    }

    /// Filename used when the response names none.
    pub fn default_filename(&self) -> String {
        match self {
            ExportKind::ThreatLogs => "threat_logs.csv".to_string(),
            ExportKind::TrafficLogs => "traffic_logs.csv".to_string(),
            ExportKind::RequestLogs => "api_logs.csv".to_string(),
            ExportKind::ServerHealthLogs(id) => format!("server_{}_health_logs.csv", id),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::ThreatLogs => f.write_str("threat logs"),
            ExportKind::TrafficLogs => f.write_str("traffic logs"),
            ExportKind::RequestLogs => f.write_str("request logs"),
            ExportKind::ServerHealthLogs(id) => write!(f, "health logs for server {}", id),
        }
    }
}

/// Download an export.
pub async fn export(executor: &RequestExecutor, kind: ExportKind) -> Result<Download, ApiError> {
    let download = executor
        .download_as(&kind.path(), &kind.default_filename())
        .await?;

    tracing::info!(
        export = %kind,
        filename = %download.filename,
        bytes = download.bytes.len(),
        "Export downloaded"
    );
    Ok(download)
}
