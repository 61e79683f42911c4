//! Request executor configuration

use serde::{Deserialize, Serialize};

/// Settings shared by every request the executor issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL used when no backend has been registered yet
    pub default_base_url: String,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries after the first attempt for timeouts and connection failures
    pub max_retries: u32,
    /// Fixed delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_base_url: "http://localhost:8000".to_string(),
            timeout_ms: 15_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.default_base_url, "http://localhost:8000");
        assert_eq!(config.timeout_ms, 15_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1_000);
    }

    #[test]
    fn test_client_config_partial_toml() {
        let config: ClientConfig = toml::from_str("max_retries = 5").unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout_ms, 15_000);
    }
}
