use crate::storage::StorageError;

/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("backend name cannot be empty")]
    EmptyName,

    #[error("backend already exists: {0}")]
    DuplicateBackend(String),

    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("persisted backend list is unreadable: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
