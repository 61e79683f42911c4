//! Configuration loading and component wiring shared by all commands

use crate::cli::GlobalArgs;
use crate::client::{RequestExecutor, RequestOptions};
use crate::config::WatchtowerConfig;
use crate::credentials::CredentialStore;
use crate::refresh::{RefreshCoordinator, RefreshPolicy};
use crate::registry::BackendRegistry;
use crate::remote::RemoteServerRegistry;
use crate::session::{SessionController, SessionSignal};
use crate::storage::{FileStore, LocalStore};
use std::sync::Arc;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &GlobalArgs,
) -> Result<WatchtowerConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        WatchtowerConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        WatchtowerConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref state_file) = args.state_file {
        config.storage.state_file = Some(state_file.clone());
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Everything a command needs, wired against one state file.
pub struct AppContext {
    pub config: WatchtowerConfig,
    pub registry: Arc<BackendRegistry>,
    pub executor: Arc<RequestExecutor>,
    pub session: SessionController,
    pub remote: RemoteServerRegistry,
}

impl AppContext {
    pub fn from_config(config: WatchtowerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let state_file = config.storage.resolve_state_file();
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::open(&state_file)?);

        let default_base_url = reqwest::Url::parse(&config.client.default_base_url)?;
        let registry = Arc::new(BackendRegistry::load(Arc::clone(&store), default_base_url)?);
        let credentials = Arc::new(CredentialStore::new(Arc::clone(&store)));
        let signal = Arc::new(SessionSignal::new());

        let executor = Arc::new(RequestExecutor::new(
            Arc::clone(&registry),
            credentials,
            signal,
            RequestOptions::from(&config.client),
        ));

        tracing::debug!(
            state_file = %state_file.display(),
            backend = %registry.get_active().base_url,
            "Client initialized"
        );

        Ok(Self {
            session: SessionController::new(Arc::clone(&executor)),
            remote: RemoteServerRegistry::new(Arc::clone(&executor)),
            config,
            registry,
            executor,
        })
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::from(&self.config.refresh)
    }

    pub fn coordinator(&self, policy: RefreshPolicy) -> RefreshCoordinator {
        RefreshCoordinator::new(Arc::clone(&self.executor), policy)
    }
}
