/// Errors raised by a [`LocalStore`](super::LocalStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored state is corrupt: {0}")]
    Corrupt(String),
}
