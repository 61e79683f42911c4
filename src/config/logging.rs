//! Logging configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Modules that accept a per-component level under `[logging.component_levels]`.
pub const COMPONENTS: [&str; 8] = [
    "client",
    "credentials",
    "exports",
    "refresh",
    "registry",
    "remote",
    "session",
    "storage",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines on stderr
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(ConfigError::Validation {
                field: "logging.format".to_string(),
                message: format!("expected 'pretty' or 'json', got '{}'", s),
            })
        }
    }
}

/// Logging configuration
///
/// The CLI is quiet by default; only warnings reach stderr unless `level`
/// or `RUST_LOG` says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Overrides keyed by component, e.g. `client = "debug"`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Reject levels `tracing` cannot parse and components this crate does not have.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_level("logging.level", &self.level)?;

        for (component, level) in &self.component_levels {
            let field = format!("logging.component_levels.{}", component);
            if !COMPONENTS.contains(&component.as_str()) {
                return Err(ConfigError::Validation {
                    field,
                    message: format!("unknown component (expected one of {})", COMPONENTS.join(", ")),
                });
            }
            check_level(&field, level)?;
        }

        Ok(())
    }
}

fn check_level(field: &str, level: &str) -> Result<(), ConfigError> {
    LevelFilter::from_str(level)
        .map(|_| ())
        .map_err(|_| ConfigError::Validation {
            field: field.to_string(),
            message: format!("'{}' is not a log level", level),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_levels_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            level = "info"
            format = "json"

            [component_levels]
            session = "debug"
            client = "trace"
            "#,
        )
        .unwrap();

        assert_eq!(config.format, LogFormat::Json);
        let components: Vec<_> = config.component_levels.keys().map(String::as_str).collect();
        assert_eq!(components, ["client", "session"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_component_rejected() {
        let mut config = LoggingConfig::default();
        config
            .component_levels
            .insert("routing".to_string(), "debug".to_string());

        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => {
                assert_eq!(field, "logging.component_levels.routing")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_level_rejected() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = LoggingConfig::default();
        config
            .component_levels
            .insert("refresh".to_string(), "verbose".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_component_levels_not_serialized() {
        let rendered = toml::to_string(&LoggingConfig::default()).unwrap();
        assert!(!rendered.contains("component_levels"));
    }

    #[test]
    fn test_log_format_env_value() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("syslog".parse::<LogFormat>().is_err());
    }
}
