//! Dashboard command implementation

use crate::cli::output::{format_dashboard_json, format_dashboard_table};
use crate::cli::{AppContext, DashboardArgs};
use crate::refresh::{DashboardSnapshot, FanOutMode, RefreshCoordinator};
use std::sync::Arc;
use std::time::Duration;

fn render(snapshot: &DashboardSnapshot, json: bool) -> Result<String, serde_json::Error> {
    if json {
        format_dashboard_json(snapshot)
    } else {
        Ok(format_dashboard_table(snapshot))
    }
}

/// Handle `watchtower dashboard`
///
/// The first load is all-or-nothing. With `--watch` the dashboard stays
/// mounted and re-renders after every periodic refresh until Ctrl-C.
pub async fn handle_dashboard(
    args: &DashboardArgs,
    ctx: &AppContext,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut policy = ctx.refresh_policy();
    if args.force {
        policy.staleness = Duration::ZERO;
    }
    let coordinator = Arc::new(ctx.coordinator(policy).starting_at_page(args.page));

    coordinator
        .refresh(args.force, FanOutMode::AllOrNothing)
        .await
        .map_err(|e| e.user_message())?;

    if !args.watch {
        return Ok(render(&coordinator.snapshot(), json)?);
    }

    println!("{}", render(&coordinator.snapshot(), json)?);
    watch(&coordinator, json).await?;
    Ok(String::new())
}

async fn watch(
    coordinator: &Arc<RefreshCoordinator>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut updates = coordinator.subscribe();
    updates.borrow_and_update();
    let handle = coordinator.mount();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                updates.borrow_and_update();
                println!("{}", render(&coordinator.snapshot(), json)?);
            }
        }
    }

    handle.stop().await;
    Ok(())
}
