//! Structured logging setup
//!
//! Builds `tracing` filter directives from [`LoggingConfig`] and installs the
//! subscriber used by the CLI.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Turn [`LoggingConfig`] into an `EnvFilter` directive string.
///
/// Component overrides are scoped to this crate's modules and come out in
/// name order.
///
/// # Examples
///
/// ```
/// use watchtower::config::LoggingConfig;
/// use watchtower::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config
///     .component_levels
///     .insert("client".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "warn,watchtower::client=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    config
        .component_levels
        .iter()
        .fold(config.level.clone(), |mut directives, (component, level)| {
            directives.push_str(&format!(",watchtower::{}={}", component, level));
            directives
        })
}

/// Initialize tracing based on configuration
///
/// `RUST_LOG` takes precedence over the configured directives. Logs go to
/// stderr so command output on stdout stays machine readable.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_filter_directives_base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_directives_components_sorted() {
        let mut levels = BTreeMap::new();
        levels.insert("session".to_string(), "info".to_string());
        levels.insert("client".to_string(), "trace".to_string());

        let config = LoggingConfig {
            level: "error".to_string(),
            format: LogFormat::Json,
            component_levels: levels,
        };

        assert_eq!(
            build_filter_directives(&config),
            "error,watchtower::client=trace,watchtower::session=info"
        );
    }
}
