//! Dashboard refresh configuration

use serde::{Deserialize, Serialize};

/// Staleness window and polling interval for dashboard refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Data younger than this is not re-fetched unless forced
    pub staleness_seconds: u64,
    /// Seconds between periodic staleness checks while a dashboard is mounted
    pub interval_seconds: u64,
    /// Rows per page for the attacked-endpoints list
    pub attack_page_size: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            staleness_seconds: 300,
            interval_seconds: 300,
            attack_page_size: 10,
        }
    }
}
