//! Local state storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STATE_DIR: &str = ".watchtower";
const STATE_FILE: &str = "state.json";

/// Where session tokens and backend configurations are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit state file; defaults to `~/.watchtower/state.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the state file path, falling back to the home directory.
    pub fn resolve_state_file(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(STATE_DIR)
            .join(STATE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_state_file_wins() {
        let config = StorageConfig {
            state_file: Some(PathBuf::from("/tmp/wt.json")),
        };
        assert_eq!(config.resolve_state_file(), PathBuf::from("/tmp/wt.json"));
    }

    #[test]
    fn test_default_state_file_under_dot_dir() {
        let path = StorageConfig::default().resolve_state_file();
        assert!(path.ends_with(".watchtower/state.json"));
    }
}
