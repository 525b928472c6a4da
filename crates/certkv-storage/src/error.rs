//! Error types for the storage adapter.

use std::io;
use std::path::PathBuf;

use certkv_tree::TreeError;
use thiserror::Error;

/// Errors returned through the [`Storage`](crate::Storage) interface.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An error from the underlying key tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl StorageError {
    /// Returns `true` when the key (or a prefix of it) does not exist.
    ///
    /// Certificate managers treat this as "not present" rather than a failure.
    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::Tree(err) if err.is_not_found())
    }

    /// Returns `true` when the key conflicts with the shape of the namespace.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::Tree(err) if err.is_type_mismatch())
    }

    /// Returns `true` when a lock wait was aborted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Tree(err) if err.is_cancelled())
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        let kind = match &err {
            StorageError::Tree(TreeError::NotFound { .. }) => io::ErrorKind::NotFound,
            StorageError::Tree(TreeError::TypeMismatch { .. }) => io::ErrorKind::InvalidInput,
            StorageError::Tree(TreeError::Cancelled(_)) => io::ErrorKind::TimedOut,
        };
        io::Error::new(kind, err)
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from loading a [`MemoryStorageConfig`](crate::MemoryStorageConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config text is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the backend cannot use.
    #[error("invalid config: {0}")]
    Invalid(String),
}
