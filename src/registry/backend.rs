use super::RegistryError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A named backend the dashboard can send requests to.
///
/// Serialized with camelCase keys so the persisted `api_config` entry keeps the
/// same shape across client versions.
///
/// # Examples
///
/// ```
/// use watchtower::registry::BackendConfig;
///
/// let config = BackendConfig::new("staging", "https://staging.example.com");
/// assert_eq!(config.name, "staging");
/// assert!(!config.is_active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Unique, non-empty name
    pub name: String,
    /// Absolute base URL, e.g. `https://api.example.com`
    pub base_url: String,
    /// Whether requests currently go to this backend
    #[serde(default)]
    pub is_active: bool,
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            is_active: false,
        }
    }
}

/// The backend requests are resolved against right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBackend {
    /// Name of the active config, or `None` for the bootstrap default
    pub name: Option<String>,
    pub base_url: Url,
}

impl ActiveBackend {
    /// Whether cookies for this origin should carry the `Secure` attribute.
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Join a request path onto the base URL, keeping any base path prefix.
    pub fn url_for(&self, path: &str) -> Result<Url, RegistryError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| RegistryError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })
    }
}
