use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about one node, returned by [`KeyTree::stat`](crate::KeyTree::stat).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// The segment this node is reached by. Empty for the root.
    pub name: String,
    /// Time of the last value write, or of creation for directories.
    pub modified: DateTime<Utc>,
    /// Length of the value in bytes. Zero for directories.
    pub size: u64,
    /// `true` if the node holds a value.
    pub is_terminal: bool,
}

impl KeyInfo {
    /// Returns `true` if the node holds children.
    pub fn is_directory(&self) -> bool {
        !self.is_terminal
    }
}
