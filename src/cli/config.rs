//! Config command handlers

use crate::cli::ConfigInitArgs;
use crate::config::ConfigError;
use std::fs;
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../watchtower.example.toml");

/// Handle `watchtower config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    write_template(&args.output, args.force)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Register a backend with `watchtower backends add <name> <url>`.");

    Ok(())
}

/// Write the annotated template, creating missing parent directories.
fn write_template(output: &Path, force: bool) -> Result<(), ConfigError> {
    if output.is_dir() {
        return Err(ConfigError::Validation {
            field: "output".to_string(),
            message: format!("{} is a directory", output.display()),
        });
    }
    if output.exists() && !force {
        return Err(ConfigError::AlreadyExists(output.to_path_buf()));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, EXAMPLE_CONFIG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchtowerConfig;

    #[test]
    fn test_written_template_loads() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("nested/conf/watchtower.toml");

        write_template(&output, false).unwrap();

        let config = WatchtowerConfig::load(Some(output.as_path())).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh.attack_page_size, 10);
    }

    #[test]
    fn test_existing_file_kept_without_force() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("watchtower.toml");
        fs::write(&output, "[client]\nmax_retries = 0\n").unwrap();

        let err = write_template(&output, false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(ref p) if p == &output));
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "[client]\nmax_retries = 0\n"
        );

        write_template(&output, true).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), EXAMPLE_CONFIG);
    }

    #[test]
    fn test_directory_target_rejected_even_with_force() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = write_template(temp_dir.path(), true).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
