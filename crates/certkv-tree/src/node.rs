use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

use crate::info::KeyInfo;
use crate::lock::AdvisoryLock;

/// Shared handle to a latched node. Only the parent's `children` map keeps a
/// node alive between operations.
pub(crate) type NodeRef = Arc<RwLock<Node>>;

pub(crate) type ReadLatch = ArcRwLockReadGuard<RawRwLock, Node>;
pub(crate) type WriteLatch = ArcRwLockWriteGuard<RawRwLock, Node>;

/// What a node holds.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Terminal(Bytes),
    Directory(BTreeMap<String, NodeRef>),
}

/// One path segment of the tree.
#[derive(Debug)]
pub(crate) struct Node {
    name: String,
    kind: NodeKind,
    modified: DateTime<Utc>,
    lock: Arc<AdvisoryLock>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::directory("")
    }

    pub(crate) fn directory(name: &str) -> Self {
        Self::with_kind(name, NodeKind::Directory(BTreeMap::new()))
    }

    pub(crate) fn terminal(name: &str, value: Bytes) -> Self {
        Self::with_kind(name, NodeKind::Terminal(value))
    }

    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            modified: Utc::now(),
            lock: Arc::new(AdvisoryLock::new()),
        }
    }

    pub(crate) fn into_ref(self) -> NodeRef {
        Arc::new(RwLock::new(self))
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal(_))
    }

    /// The value of a terminal node.
    pub(crate) fn value(&self) -> Option<&Bytes> {
        match &self.kind {
            NodeKind::Terminal(value) => Some(value),
            NodeKind::Directory(_) => None,
        }
    }

    /// The children of a directory node.
    pub(crate) fn children(&self) -> Option<&BTreeMap<String, NodeRef>> {
        match &self.kind {
            NodeKind::Directory(children) => Some(children),
            NodeKind::Terminal(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, NodeRef>> {
        match &mut self.kind {
            NodeKind::Directory(children) => Some(children),
            NodeKind::Terminal(_) => None,
        }
    }

    /// Replace the value of a terminal node in place.
    ///
    /// Returns `false` and leaves the node untouched if it is a directory.
    pub(crate) fn overwrite(&mut self, value: Bytes) -> bool {
        match &mut self.kind {
            NodeKind::Terminal(current) => {
                *current = value;
                self.modified = Utc::now();
                true
            }
            NodeKind::Directory(_) => false,
        }
    }

    pub(crate) fn lock(&self) -> Arc<AdvisoryLock> {
        Arc::clone(&self.lock)
    }

    pub(crate) fn info(&self) -> KeyInfo {
        KeyInfo {
            name: self.name.clone(),
            modified: self.modified,
            size: self.value().map_or(0, |value| value.len() as u64),
            is_terminal: self.is_terminal(),
        }
    }
}

impl Drop for Node {
    /// Tear down the subtree one level at a time. The default drop would
    /// recurse once per path segment and overflow on deep keys.
    fn drop(&mut self) {
        let NodeKind::Directory(children) = &mut self.kind else {
            return;
        };
        let mut pending: Vec<NodeRef> = std::mem::take(children).into_values().collect();
        while let Some(child) = pending.pop() {
            // Nodes still shared elsewhere are torn down by their last owner.
            let Some(latch) = Arc::into_inner(child) else {
                continue;
            };
            let mut node = latch.into_inner();
            if let Some(grandchildren) = node.children_mut() {
                pending.extend(std::mem::take(grandchildren).into_values());
            }
        }
    }
}

/// Close the advisory lock of `root` and of every node below it.
///
/// Returns the number of locks closed.
pub(crate) fn close_subtree(root: &NodeRef) -> usize {
    let mut pending = vec![Arc::clone(root)];
    let mut closed = 0;
    while let Some(node) = pending.pop() {
        let latch = node.read();
        latch.lock.close();
        closed += 1;
        if let Some(children) = latch.children() {
            pending.extend(children.values().cloned());
        }
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_an_empty_directory() {
        let root = Node::root();
        let info = root.info();
        assert_eq!(info.name, "");
        assert!(!info.is_terminal);
        assert_eq!(info.size, 0);
        assert!(root.children().unwrap().is_empty());
        assert!(root.value().is_none());
    }

    #[test]
    fn overwrite_updates_terminal_only() {
        let mut leaf = Node::terminal("a", Bytes::from_static(b"one"));
        assert!(leaf.overwrite(Bytes::from_static(b"three")));
        assert_eq!(leaf.value().unwrap().as_ref(), b"three");
        assert_eq!(leaf.info().size, 5);

        let mut dir = Node::directory("d");
        assert!(!dir.overwrite(Bytes::from_static(b"x")));
        assert!(dir.children().is_some());
    }

    #[test]
    fn close_subtree_reaches_every_node() {
        let mut top = Node::directory("a");
        let mut mid = Node::directory("b");
        let leaf = Node::terminal("c", Bytes::from_static(b"v")).into_ref();
        let leaf_lock = leaf.read().lock();
        mid.children_mut().unwrap().insert("c".into(), leaf);
        top.children_mut()
            .unwrap()
            .insert("b".into(), mid.into_ref());
        let top_lock = top.lock();
        let top = top.into_ref();

        assert_eq!(close_subtree(&top), 3);
        assert!(top_lock.is_closed());
        assert!(leaf_lock.is_closed());
    }

    #[test]
    fn deep_chain_drops_without_recursion() {
        let mut chain = Node::terminal("leaf", Bytes::from_static(b"v")).into_ref();
        for depth in 0..100_000 {
            let mut dir = Node::directory(&format!("d{depth}"));
            dir.children_mut().unwrap().insert("next".into(), chain);
            chain = dir.into_ref();
        }
        drop(chain);
    }

    #[test]
    fn drop_spares_children_shared_elsewhere() {
        let mut top = Node::directory("a");
        let kept = Node::terminal("b", Bytes::from_static(b"v")).into_ref();
        top.children_mut()
            .unwrap()
            .insert("b".into(), Arc::clone(&kept));
        drop(top);
        assert_eq!(Arc::strong_count(&kept), 1);
        assert_eq!(kept.read().value().unwrap().as_ref(), b"v");
    }
}
