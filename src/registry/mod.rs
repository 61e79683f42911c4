//! Backend Registry module.
//!
//! Holds the named backend configurations, tracks which one is active, and
//! persists the whole list to the local store on every mutation.

mod backend;
mod error;

pub use backend::*;
pub use error::*;

use crate::storage::{LocalStore, API_CONFIG_KEY};
use parking_lot::RwLock;
use reqwest::Url;
use std::sync::Arc;

/// The Backend Registry stores all configured dashboard backends.
///
/// At most one entry is active. The first entry added becomes active; removing
/// the active entry promotes the first remaining one.
///
/// # Examples
///
/// ```
/// use watchtower::registry::{BackendConfig, BackendRegistry};
/// use watchtower::storage::MemoryStore;
/// use std::sync::Arc;
///
/// let default_url = "http://localhost:8000".parse().unwrap();
/// let registry = BackendRegistry::new(Arc::new(MemoryStore::new()), default_url);
///
/// registry.add(BackendConfig::new("prod", "https://api.example.com")).unwrap();
/// registry.add(BackendConfig::new("staging", "https://staging.example.com")).unwrap();
///
/// assert_eq!(registry.get_active().name.as_deref(), Some("prod"));
/// ```
pub struct BackendRegistry {
    store: Arc<dyn LocalStore>,
    configs: RwLock<Vec<BackendConfig>>,
    default_base_url: Url,
}

impl BackendRegistry {
    /// Create an empty registry. Nothing is read from the store.
    pub fn new(store: Arc<dyn LocalStore>, default_base_url: Url) -> Self {
        Self {
            store,
            configs: RwLock::new(Vec::new()),
            default_base_url,
        }
    }

    /// Restore the registry from the `api_config` entry of the store.
    ///
    /// A missing entry yields an empty registry. Lists with more than one
    /// active flag (or none) are repaired so the first candidate wins.
    pub fn load(store: Arc<dyn LocalStore>, default_base_url: Url) -> Result<Self, RegistryError> {
        let mut configs: Vec<BackendConfig> = match store.get(API_CONFIG_KEY) {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|e| RegistryError::Corrupt(e.to_string()))?
            }
            None => Vec::new(),
        };

        let active = configs
            .iter()
            .position(|c| c.is_active)
            .or(if configs.is_empty() { None } else { Some(0) });
        for (i, config) in configs.iter_mut().enumerate() {
            config.is_active = Some(i) == active;
        }

        tracing::debug!(backends = configs.len(), "Loaded backend configurations");
        Ok(Self {
            store,
            configs: RwLock::new(configs),
            default_base_url,
        })
    }

    /// Add a backend configuration.
    ///
    /// The incoming `is_active` flag is ignored: the entry becomes active only
    /// when the registry was empty.
    ///
    /// # Errors
    ///
    /// - `RegistryError::EmptyName` if the name is blank
    /// - `RegistryError::DuplicateBackend` if the name is taken
    /// - `RegistryError::InvalidUrl` if the base URL is not an absolute http(s) URL
    pub fn add(&self, config: BackendConfig) -> Result<(), RegistryError> {
        let name = config.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        validate_base_url(&config.base_url)?;

        self.mutate(|configs| {
            if configs.iter().any(|c| c.name == name) {
                return Err(RegistryError::DuplicateBackend(name.clone()));
            }
            let is_active = configs.is_empty();
            configs.push(BackendConfig {
                name: name.clone(),
                base_url: config.base_url.clone(),
                is_active,
            });
            Ok(())
        })?;

        tracing::info!(name = %name, url = %config.base_url, "Backend added");
        Ok(())
    }

    /// Make `name` the single active backend.
    pub fn set_active(&self, name: &str) -> Result<(), RegistryError> {
        self.mutate(|configs| {
            if !configs.iter().any(|c| c.name == name) {
                return Err(RegistryError::BackendNotFound(name.to_string()));
            }
            for config in configs.iter_mut() {
                config.is_active = config.name == name;
            }
            Ok(())
        })?;

        tracing::info!(name = %name, "Active backend changed");
        Ok(())
    }

    /// Remove a backend. If it was active, the first remaining entry is
    /// activated.
    pub fn remove(&self, name: &str) -> Result<BackendConfig, RegistryError> {
        let removed = self.mutate(|configs| {
            let index = configs
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| RegistryError::BackendNotFound(name.to_string()))?;
            let removed = configs.remove(index);
            if removed.is_active {
                if let Some(first) = configs.first_mut() {
                    first.is_active = true;
                }
            }
            Ok(removed)
        })?;

        tracing::info!(name = %name, was_active = removed.is_active, "Backend removed");
        Ok(removed)
    }

    /// The active backend, or the process-wide default when none is registered.
    pub fn get_active(&self) -> ActiveBackend {
        let configs = self.configs.read();
        configs
            .iter()
            .find(|c| c.is_active)
            .and_then(|c| {
                Url::parse(&c.base_url).ok().map(|base_url| ActiveBackend {
                    name: Some(c.name.clone()),
                    base_url,
                })
            })
            .unwrap_or_else(|| ActiveBackend {
                name: None,
                base_url: self.default_base_url.clone(),
            })
    }

    /// Get a backend by name.
    pub fn get(&self, name: &str) -> Option<BackendConfig> {
        self.configs.read().iter().find(|c| c.name == name).cloned()
    }

    /// All backends in insertion order.
    pub fn list(&self) -> Vec<BackendConfig> {
        self.configs.read().clone()
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }

    /// Apply `f` to a copy of the list, persist the copy, then publish it.
    ///
    /// The write lock is held across persistence so readers never observe a
    /// list that is not yet stored, and a failed write leaves nothing changed.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<BackendConfig>) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut guard = self.configs.write();
        let mut next = guard.clone();
        let result = f(&mut next)?;

        let json =
            serde_json::to_string(&next).map_err(|e| RegistryError::Corrupt(e.to_string()))?;
        self.store.set(API_CONFIG_KEY, &json)?;

        *guard = next;
        Ok(result)
    }
}

fn validate_base_url(raw: &str) -> Result<(), RegistryError> {
    let url = Url::parse(raw).map_err(|e| RegistryError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(RegistryError::InvalidUrl {
            url: raw.to_string(),
            reason: "expected an absolute http(s) URL".to_string(),
        });
    }
    Ok(())
}
