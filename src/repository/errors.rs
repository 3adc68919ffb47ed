use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted store {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<tempfile::PersistError> for RepositoryError {
    fn from(err: tempfile::PersistError) -> Self {
        RepositoryError::Io(err.error)
    }
}
