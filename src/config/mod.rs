//! Configuration module for Watchtower
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`WATCHTOWER_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use watchtower::config::WatchtowerConfig;
//!
//! let config = WatchtowerConfig::default();
//! assert_eq!(config.client.timeout_ms, 15_000);
//!
//! let toml = r#"
//! [client]
//! max_retries = 1
//! "#;
//! let config: WatchtowerConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.client.max_retries, 1);
//! ```

pub mod client;
pub mod error;
pub mod logging;
pub mod refresh;
pub mod storage;

pub use client::ClientConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use refresh::RefreshConfig;
pub use storage::StorageConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Watchtower client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WatchtowerConfig {
    /// Request executor settings
    pub client: ClientConfig,
    /// Dashboard refresh settings
    pub refresh: RefreshConfig,
    /// Local state persistence
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl WatchtowerConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports WATCHTOWER_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("WATCHTOWER_BASE_URL") {
            self.client.default_base_url = url;
        }
        if let Ok(timeout) = std::env::var("WATCHTOWER_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.client.timeout_ms = t;
            }
        }
        if let Ok(retries) = std::env::var("WATCHTOWER_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                self.client.max_retries = r;
            }
        }
        if let Ok(path) = std::env::var("WATCHTOWER_STATE_FILE") {
            self.storage.state_file = Some(path.into());
        }

        if let Ok(level) = std::env::var("WATCHTOWER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WATCHTOWER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.client.default_base_url) {
            Ok(url) if url.has_host() => {}
            Ok(_) => {
                return Err(ConfigError::Validation {
                    field: "client.default_base_url".to_string(),
                    message: "URL must be absolute".to_string(),
                })
            }
            Err(e) => {
                return Err(ConfigError::Validation {
                    field: "client.default_base_url".to_string(),
                    message: e.to_string(),
                })
            }
        }

        if self.client.timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "client.timeout_ms".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        if self.refresh.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "refresh.interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }

        if self.refresh.attack_page_size == 0 {
            return Err(ConfigError::Validation {
                field: "refresh.attack_page_size".to_string(),
                message: "page size must be non-zero".to_string(),
            });
        }

        self.logging.validate()
    }
}
