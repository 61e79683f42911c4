//! CLI module for Watchtower
//!
//! Command-line front end for the Watchtower monitoring dashboard API.
//!
//! # Commands
//!
//! - `backends` - Manage dashboard backends (list, add, remove, use)
//! - `login` / `logout` / `whoami` - Session management
//! - `servers` - Manage monitored remote servers
//! - `dashboard` - Show the security dashboard
//! - `export` - Download CSV log exports
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! watchtower backends add prod https://watchtower.example.com/api
//! watchtower login admin
//! watchtower dashboard --watch
//! ```

pub mod auth;
pub mod backends;
pub mod completions;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod export;
pub mod output;
pub mod servers;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use context::{load_config_with_overrides, AppContext};

use crate::remote::{AuthType, RemoteServerInput};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Watchtower - security monitoring dashboard client
#[derive(Parser, Debug)]
#[command(
    name = "watchtower",
    version,
    about = "Client for the Watchtower security monitoring dashboard"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "watchtower.toml")]
    pub config: PathBuf,

    /// Override the state file holding tokens and backends
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage dashboard backends
    #[command(subcommand)]
    Backends(BackendsCommands),
    /// Log in to the active backend
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage monitored remote servers
    #[command(subcommand)]
    Servers(ServersCommands),
    /// Show the security dashboard
    Dashboard(DashboardArgs),
    /// Download a CSV log export
    Export(ExportArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Subcommand, Debug)]
pub enum BackendsCommands {
    /// List configured backends
    List,
    /// Add a backend; the first one added becomes active
    Add(BackendsAddArgs),
    /// Remove a backend
    Remove(BackendNameArgs),
    /// Make a backend the active one
    Use(BackendNameArgs),
}

#[derive(Args, Debug)]
pub struct BackendsAddArgs {
    /// Unique backend name
    pub name: String,

    /// Base URL, e.g. https://watchtower.example.com/api
    pub url: String,
}

#[derive(Args, Debug)]
pub struct BackendNameArgs {
    /// Backend name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username
    pub username: String,

    /// Password (prompted on stdin when omitted)
    #[arg(short, long, env = "WATCHTOWER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ServersCommands {
    /// List remote servers
    List,
    /// Show one remote server
    Show(ServerIdArgs),
    /// Register a remote server
    Add(ServerAddArgs),
    /// Update a remote server
    Update(ServerUpdateArgs),
    /// Delete a remote server
    Delete(ServerIdArgs),
    /// Check a server's status now
    Check(ServerIdArgs),
    /// Run endpoint discovery
    Discover(DiscoverArgs),
    /// List discovered endpoints
    Endpoints(ServerIdArgs),
    /// Run a health scan over discovered endpoints
    Scan(ServerIdArgs),
}

#[derive(Args, Debug)]
pub struct ServerIdArgs {
    /// Remote server ID
    pub id: i64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTypeArg {
    Basic,
    Token,
}

impl From<AuthTypeArg> for AuthType {
    fn from(arg: AuthTypeArg) -> Self {
        match arg {
            AuthTypeArg::Basic => AuthType::Basic,
            AuthTypeArg::Token => AuthType::Token,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ServerFields {
    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// How the server authenticates health probes
    #[arg(short = 't', long, value_enum)]
    pub auth_type: Option<AuthTypeArg>,

    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long)]
    pub password: Option<String>,

    /// Token endpoint for token auth
    #[arg(long)]
    pub token_endpoint: Option<String>,

    #[arg(long)]
    pub api_key: Option<String>,

    /// Explicit health check URL
    #[arg(long)]
    pub health_check_url: Option<String>,
}

impl ServerFields {
    fn into_input(self, name: Option<String>, base_url: Option<String>) -> RemoteServerInput {
        RemoteServerInput {
            name,
            base_url,
            description: self.description,
            auth_type: self.auth_type.map(AuthType::from),
            username: self.username,
            password: self.password,
            token_endpoint: self.token_endpoint,
            api_key: self.api_key,
            health_check_url: self.health_check_url,
            is_active: None,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServerAddArgs {
    /// Server name
    pub name: String,

    /// Server base URL
    pub url: String,

    #[command(flatten)]
    pub fields: ServerFields,
}

impl ServerAddArgs {
    pub fn into_input(self) -> RemoteServerInput {
        self.fields.into_input(Some(self.name), Some(self.url))
    }
}

#[derive(Args, Debug)]
pub struct ServerUpdateArgs {
    /// Remote server ID
    pub id: i64,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Enable or disable monitoring
    #[arg(long)]
    pub active: Option<bool>,

    #[command(flatten)]
    pub fields: ServerFields,
}

impl ServerUpdateArgs {
    pub fn into_input(self) -> RemoteServerInput {
        let active = self.active;
        let mut input = self.fields.into_input(self.name, self.url);
        input.is_active = active;
        input
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Remote server ID
    pub id: i64,

    /// Poll until the discovered endpoint count settles
    #[arg(short, long)]
    pub wait: bool,

    /// Milliseconds between polls
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,

    /// Maximum number of polls
    #[arg(long, default_value = "15")]
    pub max_polls: u32,
}

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Ignore the staleness window
    #[arg(short, long)]
    pub force: bool,

    /// Keep refreshing until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Attacked-endpoints page
    #[arg(short, long, default_value = "1")]
    pub page: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// Threat log CSV
    Threats,
    /// Traffic log CSV
    Traffic,
    /// API request log CSV
    Requests,
    /// Health-check history of one remote server
    Health,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// What to export
    #[arg(value_enum)]
    pub target: ExportTarget,

    /// Remote server ID (required for `health`)
    #[arg(short, long, required_if_eq("target", "health"))]
    pub server: Option<i64>,

    /// Directory to write the file into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "watchtower.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_global_defaults() {
        let cli = Cli::try_parse_from(["watchtower", "whoami"]).unwrap();
        assert_eq!(cli.global.config, PathBuf::from("watchtower.toml"));
        assert!(cli.global.state_file.is_none());
        assert!(!cli.global.json);
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "watchtower",
            "backends",
            "list",
            "--json",
            "-c",
            "custom.toml",
        ])
        .unwrap();
        assert!(cli.global.json);
        assert_eq!(cli.global.config, PathBuf::from("custom.toml"));
        assert!(matches!(
            cli.command,
            Commands::Backends(BackendsCommands::List)
        ));
    }

    #[test]
    fn test_cli_parse_backends_add() {
        let cli = Cli::try_parse_from([
            "watchtower",
            "backends",
            "add",
            "prod",
            "https://api.example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Backends(BackendsCommands::Add(args)) => {
                assert_eq!(args.name, "prod");
                assert_eq!(args.url, "https://api.example.com");
            }
            _ => panic!("Expected Backends Add command"),
        }
    }

    #[test]
    fn test_cli_parse_login_with_password() {
        let cli =
            Cli::try_parse_from(["watchtower", "login", "admin", "--password", "secret"]).unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.username, "admin");
                assert_eq!(args.password.as_deref(), Some("secret"));
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_cli_parse_servers_add_with_fields() {
        let cli = Cli::try_parse_from([
            "watchtower",
            "servers",
            "add",
            "edge",
            "http://10.0.0.5:9000",
            "--auth-type",
            "token",
            "--token-endpoint",
            "/auth/token",
        ])
        .unwrap();
        match cli.command {
            Commands::Servers(ServersCommands::Add(args)) => {
                let input = args.into_input();
                assert_eq!(input.name.as_deref(), Some("edge"));
                assert_eq!(input.auth_type, Some(AuthType::Token));
                assert_eq!(input.token_endpoint.as_deref(), Some("/auth/token"));
            }
            _ => panic!("Expected Servers Add command"),
        }
    }

    #[test]
    fn test_cli_parse_servers_update_active_flag() {
        let cli = Cli::try_parse_from([
            "watchtower",
            "servers",
            "update",
            "5",
            "--active",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Servers(ServersCommands::Update(args)) => {
                assert_eq!(args.id, 5);
                let input = args.into_input();
                assert_eq!(input.is_active, Some(false));
                assert!(input.name.is_none());
            }
            _ => panic!("Expected Servers Update command"),
        }
    }

    #[test]
    fn test_cli_parse_dashboard() {
        let cli =
            Cli::try_parse_from(["watchtower", "dashboard", "--force", "--page", "3"]).unwrap();
        match cli.command {
            Commands::Dashboard(args) => {
                assert!(args.force);
                assert!(!args.watch);
                assert_eq!(args.page, 3);
            }
            _ => panic!("Expected Dashboard command"),
        }
    }

    #[test]
    fn test_cli_export_health_requires_server() {
        assert!(Cli::try_parse_from(["watchtower", "export", "health"]).is_err());
        let cli =
            Cli::try_parse_from(["watchtower", "export", "health", "--server", "4"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.target, ExportTarget::Health);
                assert_eq!(args.server, Some(4));
                assert_eq!(args.out, PathBuf::from("."));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["watchtower", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert!(args.force);
                assert_eq!(args.output, PathBuf::from("watchtower.toml"));
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_parse_completions() {
        let cli = Cli::try_parse_from(["watchtower", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions(_)));
    }
}
