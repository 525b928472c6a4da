//! The [`Storage`] trait defining the certificate storage interface.

use async_trait::async_trait;
use bytes::Bytes;
use certkv_tree::{Cancellation, KeyInfo};

use crate::error::StorageResult;

/// Storage backend for a certificate manager.
///
/// Keys are `/`-separated paths. Callers that need isolation around a key
/// bracket their reads and writes with [`lock`](Self::lock) and
/// [`unlock`](Self::unlock); the other methods never wait on those locks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Wait for and take the advisory lock on `name`.
    async fn lock(&self, name: &str, cancel: &Cancellation) -> StorageResult<()>;

    /// Wait for and release the advisory lock on `name`.
    async fn unlock(&self, name: &str, cancel: &Cancellation) -> StorageResult<()>;

    /// Create or overwrite the value at `key`.
    async fn store(&self, key: &str, value: Bytes) -> StorageResult<()>;

    /// Read the value at `key`.
    async fn load(&self, key: &str) -> StorageResult<Bytes>;

    /// Remove `key` and everything under it. Absent keys are not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Returns `true` if anything is stored at `key`.
    async fn exists(&self, key: &str) -> bool;

    /// Keys under `prefix`, optionally including all descendants.
    async fn list(&self, prefix: &str, recursive: bool) -> StorageResult<Vec<String>>;

    /// Metadata about `key`.
    async fn stat(&self, key: &str) -> StorageResult<KeyInfo>;
}
