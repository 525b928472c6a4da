//! In-memory key tree for certificate storage.
//!
//! This crate holds binary values under slash-delimited keys, the way a
//! certificate manager lays out accounts, certificates and OCSP staples on a
//! filesystem, but entirely in process memory.
//!
//! # Architecture
//!
//! - **Nodes** are one per path segment. A node is either a *terminal* node
//!   holding a value or a *directory* holding named children, never both.
//! - **Advisory locks** live one per node. Callers bracket a critical section
//!   on a key with [`KeyTree::lock`] / [`KeyTree::unlock`]; the tree itself
//!   never takes them implicitly.
//! - **Latches** are short-held reader/writer locks that guard each node's
//!   fields. Walks take them hand-over-hand from parent to child and never hold
//!   one across an `.await`, so there is no tree-wide lock.
//!
//! # Modules
//!
//! - [`error`]: [`TreeError`] and [`LockError`]
//! - [`cancel`]: [`Cancellation`] signals for lock waits
//! - [`lock`]: the [`AdvisoryLock`] primitive
//! - [`path`]: [`KeyPath`] parsing
//! - [`info`]: [`KeyInfo`] metadata returned by `stat`
//! - [`tree`]: the [`KeyTree`] itself

pub mod cancel;
pub mod error;
pub mod info;
pub mod lock;
pub mod path;
pub mod tree;

mod node;

pub use cancel::{CancelHandle, CancelReason, Cancellation};
pub use error::{LockError, NodeType, TreeError, TreeResult};
pub use info::KeyInfo;
pub use lock::AdvisoryLock;
pub use path::KeyPath;
pub use tree::KeyTree;
