//! Certificate storage backend over the certkv key tree.
//!
//! A certificate manager talks to its storage through a small interface:
//! lock/unlock a name around issuance or renewal, store and load blobs, and
//! enumerate or inspect what is stored. This crate defines that interface as
//! the [`Storage`] trait and implements it with [`MemoryStorage`], an adapter
//! over a shared [`KeyTree`](certkv_tree::KeyTree).
//!
//! # Modules
//!
//! - [`error`]: [`StorageError`] and [`ConfigError`]
//! - [`config`]: [`MemoryStorageConfig`], loadable from TOML
//! - [`traits`]: the [`Storage`] trait
//! - [`memory`]: the [`MemoryStorage`] backend

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::MemoryStorageConfig;
pub use error::{ConfigError, StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use traits::Storage;

// Re-export the types that appear in the trait signatures.
pub use certkv_tree::{CancelHandle, CancelReason, Cancellation, KeyInfo, KeyTree};
