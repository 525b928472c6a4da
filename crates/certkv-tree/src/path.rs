//! Key parsing.
//!
//! Keys are split on `/` with no escaping. The empty key is the root and has
//! no segments; every other key has at least one segment, and empty segments
//! (from `a//b` or a leading `/`) are ordinary children named `""`.

use std::fmt;

/// A key split into its path segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> KeyPath<'a> {
    /// Split a key into segments.
    pub fn parse(key: &'a str) -> Self {
        if key.is_empty() {
            return Self::root();
        }
        Self {
            segments: key.split('/').collect(),
        }
    }

    /// Split a listing prefix, ignoring one trailing `/`.
    pub fn parse_prefix(prefix: &'a str) -> Self {
        Self::parse(prefix.strip_suffix('/').unwrap_or(prefix))
    }

    /// The root path.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns `true` if this path addresses the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// The ancestor segments and the final segment. `None` for the root.
    pub fn split_last(&self) -> Option<(&[&'a str], &'a str)> {
        self.segments
            .split_last()
            .map(|(last, parents)| (parents, *last))
    }

    /// The key formed by the first `depth` segments.
    pub fn prefix_key(&self, depth: usize) -> String {
        self.segments[..depth.min(self.segments.len())].join("/")
    }
}

impl fmt::Display for KeyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Full key of the child `name` under the directory key `parent`.
pub fn child_key(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
