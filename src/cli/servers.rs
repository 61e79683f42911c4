//! Remote server commands

use crate::cli::output::{
    format_endpoints_table, format_json, format_servers_table, status_cell, ServerView,
};
use crate::cli::{DiscoverArgs, ServerAddArgs, ServerIdArgs, ServerUpdateArgs};
use crate::client::ApiError;
use crate::remote::RemoteServerRegistry;
use std::time::Duration;

type CmdResult = Result<String, Box<dyn std::error::Error>>;

/// Backend errors are shown the way the dashboard shows them.
fn user_facing(e: ApiError) -> Box<dyn std::error::Error> {
    e.user_message().into()
}

/// Handle `watchtower servers list`
pub async fn handle_servers_list(remote: &RemoteServerRegistry, json: bool) -> CmdResult {
    let servers = remote.refresh().await.map_err(user_facing)?;
    let views: Vec<ServerView> = servers.iter().map(ServerView::from).collect();

    if json {
        Ok(format_json("servers", &views)?)
    } else if views.is_empty() {
        Ok("No remote servers registered".to_string())
    } else {
        Ok(format_servers_table(&views))
    }
}

/// Handle `watchtower servers show`
pub async fn handle_servers_show(
    args: &ServerIdArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let server = remote.fetch(args.id).await.map_err(user_facing)?;
    if json {
        return Ok(format_json("server", &server)?);
    }

    let mut out = format_servers_table(&[ServerView::from(&server)]);
    if let Some(description) = &server.description {
        out.push_str(&format!("\nDescription: {}", description));
    }
    out.push_str(&format!("\nAuth: {}", server.auth_type));
    if let Some(url) = &server.health_check_url {
        out.push_str(&format!("\nHealth check: {}", url));
    }
    Ok(out)
}

/// Handle `watchtower servers add`
pub async fn handle_servers_add(
    args: ServerAddArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let server = remote
        .add(&args.into_input())
        .await
        .map_err(user_facing)?;
    if json {
        Ok(format_json("server", &server)?)
    } else {
        Ok(format!("✓ Added remote server '{}' (id {})", server.name, server.id))
    }
}

/// Handle `watchtower servers update`
pub async fn handle_servers_update(
    args: ServerUpdateArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let id = args.id;
    let server = remote
        .update(id, &args.into_input())
        .await
        .map_err(user_facing)?;
    if json {
        Ok(format_json("server", &server)?)
    } else {
        Ok(format!("✓ Updated remote server '{}' (id {})", server.name, id))
    }
}

/// Handle `watchtower servers delete`
pub async fn handle_servers_delete(args: &ServerIdArgs, remote: &RemoteServerRegistry) -> CmdResult {
    remote.delete(args.id).await.map_err(user_facing)?;
    Ok(format!("✓ Deleted remote server {}", args.id))
}

/// Handle `watchtower servers check`
pub async fn handle_servers_check(
    args: &ServerIdArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let check = remote.check_status(args.id).await.map_err(user_facing)?;
    if json {
        return Ok(format_json(
            "status",
            &serde_json::json!({
                "id": args.id,
                "status": check.status,
                "last_checked": check.last_checked,
                "last_error": check.last_error,
                "retry_count": check.retry_count,
            }),
        )?);
    }

    let mut out = format!(
        "Server {}: {}",
        args.id,
        check.status.map(status_cell).unwrap_or_else(|| "-".into())
    );
    if let Some(error) = &check.last_error {
        out.push_str(&format!("\nLast error: {}", error));
    }
    Ok(out)
}

/// Handle `watchtower servers discover`
pub async fn handle_servers_discover(args: &DiscoverArgs, remote: &RemoteServerRegistry) -> CmdResult {
    let message = remote.run_discovery(args.id).await.map_err(user_facing)?;
    if !args.wait {
        return Ok(if message.is_empty() {
            format!("✓ Discovery started for server {}", args.id)
        } else {
            format!("✓ {}", message)
        });
    }

    let count = remote
        .poll_discovery(
            args.id,
            Duration::from_millis(args.poll_interval_ms),
            args.max_polls,
        )
        .await
        .map_err(user_facing)?;
    Ok(format!(
        "✓ {} endpoint(s) discovered on server {}",
        count, args.id
    ))
}

/// Handle `watchtower servers endpoints`
pub async fn handle_servers_endpoints(
    args: &ServerIdArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let endpoints = remote
        .discovered_endpoints(args.id)
        .await
        .map_err(user_facing)?;
    if json {
        Ok(format_json("endpoints", &endpoints)?)
    } else if endpoints.is_empty() {
        Ok(format!(
            "No endpoints discovered on server {}. Run `watchtower servers discover {}`.",
            args.id, args.id
        ))
    } else {
        Ok(format_endpoints_table(&endpoints))
    }
}

/// Handle `watchtower servers scan`
pub async fn handle_servers_scan(
    args: &ServerIdArgs,
    remote: &RemoteServerRegistry,
    json: bool,
) -> CmdResult {
    let report = remote.run_health_scan(args.id).await.map_err(user_facing)?;
    if json {
        Ok(format_json("scan", &report)?)
    } else {
        Ok(format!("✓ {}", report.message))
    }
}
