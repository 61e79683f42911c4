//! Export command implementation

use crate::cli::{ExportArgs, ExportTarget};
use crate::client::RequestExecutor;
use crate::exports::{export, ExportKind};

/// Handle `watchtower export`
pub async fn handle_export(
    args: &ExportArgs,
    executor: &RequestExecutor,
) -> Result<String, Box<dyn std::error::Error>> {
    let kind = match args.target {
        ExportTarget::Threats => ExportKind::ThreatLogs,
        ExportTarget::Traffic => ExportKind::TrafficLogs,
        ExportTarget::Requests => ExportKind::RequestLogs,
        ExportTarget::Health => ExportKind::ServerHealthLogs(
            args.server
                .ok_or("--server is required for health log exports")?,
        ),
    };

    let download = export(executor, kind)
        .await
        .map_err(|e| e.user_message())?;
    let path = download.save_to(&args.out)?;

    Ok(format!(
        "✓ Saved {} ({} bytes) to {}",
        kind,
        download.bytes.len(),
        path.display()
    ))
}
