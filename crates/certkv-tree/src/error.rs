//! Error types for key tree and advisory lock operations.

use std::fmt;

use thiserror::Error;

use crate::cancel::CancelReason;

/// The two shapes a node can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A node holding a value.
    Terminal,
    /// A node holding named children.
    Directory,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => f.write_str("terminal"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// Errors from a single [`AdvisoryLock`](crate::AdvisoryLock).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The wait was aborted before the lock state changed.
    #[error("lock wait {0}")]
    Cancelled(CancelReason),

    /// The lock belongs to a node that has been deleted.
    #[error("lock closed")]
    Closed,
}

/// Errors from [`KeyTree`](crate::KeyTree) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Some segment along the key's path does not exist.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A node along the path has the wrong shape for the operation.
    #[error("type mismatch at {key:?}: expected {expected}")]
    TypeMismatch { key: String, expected: NodeType },

    /// A lock wait was aborted. Lock state is unchanged.
    #[error("lock wait {0}")]
    Cancelled(CancelReason),
}

impl TreeError {
    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub(crate) fn expected_directory(key: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: NodeType::Directory,
        }
    }

    pub(crate) fn expected_terminal(key: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: NodeType::Terminal,
        }
    }

    /// Returns `true` for [`TreeError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`TreeError::TypeMismatch`].
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Returns `true` for [`TreeError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Map a lock failure on the node at `key` into a tree error.
    ///
    /// A closed lock means the node was deleted while the caller waited.
    pub(crate) fn from_lock(key: &str, err: LockError) -> Self {
        match err {
            LockError::Cancelled(reason) => Self::Cancelled(reason),
            LockError::Closed => Self::not_found(key),
        }
    }
}

/// Convenience alias for key tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TreeError::not_found("a/b").to_string(),
            "key not found: a/b"
        );
        assert_eq!(
            TreeError::expected_directory("a").to_string(),
            "type mismatch at \"a\": expected directory"
        );
        assert_eq!(
            TreeError::Cancelled(CancelReason::DeadlineExceeded).to_string(),
            "lock wait deadline exceeded"
        );
    }

    #[test]
    fn closed_lock_maps_to_not_found() {
        let err = TreeError::from_lock("certs/a.crt", LockError::Closed);
        assert!(err.is_not_found());

        let err = TreeError::from_lock("x", LockError::Cancelled(CancelReason::Cancelled));
        assert_eq!(err, TreeError::Cancelled(CancelReason::Cancelled));
    }
}
