//! Backends command implementation

use crate::cli::output::{format_backends_table, format_json, BackendView};
use crate::cli::{BackendNameArgs, BackendsAddArgs};
use crate::registry::{BackendConfig, BackendRegistry};

/// Handle `watchtower backends list`
pub fn handle_backends_list(
    registry: &BackendRegistry,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let views: Vec<BackendView> = registry.list().iter().map(BackendView::from).collect();

    if json {
        return Ok(format_json("backends", &views)?);
    }
    if views.is_empty() {
        return Ok(format!(
            "No backends configured; requests go to {}",
            registry.get_active().base_url
        ));
    }
    Ok(format_backends_table(&views))
}

/// Handle `watchtower backends add`
pub fn handle_backends_add(
    args: &BackendsAddArgs,
    registry: &BackendRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    registry.add(BackendConfig::new(&args.name, &args.url))?;

    let active = registry.get_active();
    if active.name.as_deref() == Some(args.name.trim()) {
        Ok(format!("✓ Added backend '{}' (active)", args.name.trim()))
    } else {
        Ok(format!("✓ Added backend '{}'", args.name.trim()))
    }
}

/// Handle `watchtower backends remove`
pub fn handle_backends_remove(
    args: &BackendNameArgs,
    registry: &BackendRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    let removed = registry.remove(&args.name)?;

    let mut msg = format!("✓ Removed backend '{}'", removed.name);
    if removed.is_active {
        match registry.get_active().name {
            Some(next) => msg.push_str(&format!("; '{}' is now active", next)),
            None => msg.push_str("; no backends remain"),
        }
    }
    Ok(msg)
}

/// Handle `watchtower backends use`
pub fn handle_backends_use(
    args: &BackendNameArgs,
    registry: &BackendRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    registry.set_active(&args.name)?;
    Ok(format!("✓ Now using backend '{}'", args.name))
}
