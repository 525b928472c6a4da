//! The [`KeyTree`]: hierarchical blob storage with per-key advisory locks.
//!
//! Every operation parses its key into a [`KeyPath`] and walks from the root
//! one segment at a time. The walk is a loop, not recursion, so key depth is
//! bounded only by memory. Latches are taken hand-over-hand: the child's
//! latch is acquired before the parent's is released, and always in
//! parent-to-child order, so walks cannot deadlock against each other.
//!
//! Only [`lock`](KeyTree::lock) and [`unlock`](KeyTree::unlock) suspend. They
//! resolve the node's [`AdvisoryLock`], drop every latch, and only then wait.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::cancel::Cancellation;
use crate::error::{TreeError, TreeResult};
use crate::info::KeyInfo;
use crate::lock::AdvisoryLock;
use crate::node::{close_subtree, Node, NodeRef, ReadLatch, WriteLatch};
use crate::path::{child_key, KeyPath};

/// In-memory tree of terminal and directory nodes addressed by `/` keys.
pub struct KeyTree {
    root: NodeRef,
}

impl KeyTree {
    /// Create a tree holding only the empty root directory.
    pub fn new() -> Self {
        Self {
            root: Node::root().into_ref(),
        }
    }

    /// Wait for and take the advisory lock of the node at `key`.
    ///
    /// The node must already exist. Locks are not reentrant: locking the same
    /// key twice without an unlock in between waits forever unless `cancel`
    /// fires.
    pub async fn lock(&self, key: &str, cancel: &Cancellation) -> TreeResult<()> {
        let lock = self.advisory_lock(key)?;
        if lock.is_held() {
            trace!(key, "waiting for contended lock");
        }
        lock.acquire(cancel).await.map_err(|err| {
            debug!(key, error = %err, "lock wait aborted");
            TreeError::from_lock(key, err)
        })?;
        debug!(key, "lock acquired");
        Ok(())
    }

    /// Wait for and clear the advisory lock of the node at `key`.
    ///
    /// Not ownership-checked: any caller may release. Releasing a free lock
    /// waits until someone takes it.
    pub async fn unlock(&self, key: &str, cancel: &Cancellation) -> TreeResult<()> {
        let lock = self.advisory_lock(key)?;
        lock.release(cancel).await.map_err(|err| {
            debug!(key, error = %err, "unlock wait aborted");
            TreeError::from_lock(key, err)
        })?;
        debug!(key, "lock released");
        Ok(())
    }

    /// Take the advisory lock of the node at `key` if it is free right now.
    pub fn try_lock(&self, key: &str) -> TreeResult<bool> {
        let lock = self.advisory_lock(key)?;
        let acquired = lock
            .try_acquire()
            .map_err(|err| TreeError::from_lock(key, err))?;
        debug!(key, acquired, "try lock");
        Ok(acquired)
    }

    /// Create or overwrite the terminal node at `key`.
    ///
    /// Missing directories along the path are created. Fails with
    /// [`TreeError::TypeMismatch`] when the path runs through a terminal node
    /// or `key` names a directory; nothing is created in either case.
    pub fn store(&self, key: &str, value: impl Into<Bytes>) -> TreeResult<()> {
        let value = value.into();
        let path = KeyPath::parse(key);
        let Some((parents, leaf)) = path.split_last() else {
            return Err(TreeError::expected_terminal(key));
        };

        // Failures can only happen at pre-existing nodes, and every node
        // created below is an empty directory, so nothing is created before
        // the last point of failure.
        let mut latch = self.root.write_arc();
        for (depth, segment) in parents.iter().enumerate() {
            let children = latch
                .children_mut()
                .ok_or_else(|| TreeError::expected_directory(path.prefix_key(depth)))?;
            let next = match children.get(*segment) {
                Some(child) => Arc::clone(child),
                None => {
                    let child = Node::directory(segment).into_ref();
                    children.insert((*segment).to_string(), Arc::clone(&child));
                    trace!(key = %path.prefix_key(depth + 1), "created directory");
                    child
                }
            };
            latch = next.write_arc();
        }

        let children = latch
            .children_mut()
            .ok_or_else(|| TreeError::expected_directory(path.prefix_key(parents.len())))?;
        let size = value.len();
        match children.get(leaf) {
            Some(existing) => {
                if !existing.write().overwrite(value) {
                    return Err(TreeError::expected_terminal(key));
                }
            }
            None => {
                children.insert(leaf.to_string(), Node::terminal(leaf, value).into_ref());
            }
        }
        debug!(key, size, "stored value");
        Ok(())
    }

    /// The value of the terminal node at `key`.
    pub fn load(&self, key: &str) -> TreeResult<Bytes> {
        let path = KeyPath::parse(key);
        let latch = self.latch(&path, path.segments())?;
        latch
            .value()
            .cloned()
            .ok_or_else(|| TreeError::expected_terminal(key))
    }

    /// Remove the node at `key` together with everything below it.
    ///
    /// Removing an absent key succeeds. Waiters on the advisory lock of any
    /// removed node wake with [`TreeError::NotFound`].
    pub fn delete(&self, key: &str) -> TreeResult<()> {
        let path = KeyPath::parse(key);
        let Some((parents, leaf)) = path.split_last() else {
            return Err(TreeError::expected_terminal(key));
        };

        let mut parent = match self.latch_mut(&path, parents) {
            Ok(latch) => latch,
            Err(TreeError::NotFound { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };
        let children = parent
            .children_mut()
            .ok_or_else(|| TreeError::expected_directory(path.prefix_key(parents.len())))?;
        let Some(removed) = children.remove(leaf) else {
            return Ok(());
        };
        drop(parent);

        let closed = close_subtree(&removed);
        debug!(key, nodes = closed, "deleted");
        Ok(())
    }

    /// Returns `true` if a node exists at `key`. The root always exists.
    pub fn exists(&self, key: &str) -> bool {
        let path = KeyPath::parse(key);
        self.latch(&path, path.segments()).is_ok()
    }

    /// Full keys of the children of the directory at `prefix`.
    ///
    /// One trailing `/` on `prefix` is ignored. Children are listed in byte
    /// order of their names; with `recursive`, each directory is followed by
    /// its own listing (pre-order).
    pub fn list(&self, prefix: &str, recursive: bool) -> TreeResult<Vec<String>> {
        let path = KeyPath::parse_prefix(prefix);
        let base = path.to_string();

        let dir = self.latch(&path, path.segments())?;
        let children = dir
            .children()
            .ok_or_else(|| TreeError::expected_directory(base.as_str()))?;
        let mut pending: Vec<(String, NodeRef)> = children
            .iter()
            .rev()
            .map(|(name, child)| (child_key(&base, name), Arc::clone(child)))
            .collect();
        drop(dir);

        let mut keys = Vec::with_capacity(pending.len());
        while let Some((key, node)) = pending.pop() {
            if recursive {
                let latch = node.read();
                if let Some(children) = latch.children() {
                    pending.extend(
                        children
                            .iter()
                            .rev()
                            .map(|(name, child)| (child_key(&key, name), Arc::clone(child))),
                    );
                }
            }
            keys.push(key);
        }
        Ok(keys)
    }

    /// Metadata of the node at `key`, without its value.
    pub fn stat(&self, key: &str) -> TreeResult<KeyInfo> {
        let path = KeyPath::parse(key);
        Ok(self.latch(&path, path.segments())?.info())
    }

    /// Resolve the advisory lock for `key`. The root has none to offer.
    fn advisory_lock(&self, key: &str) -> TreeResult<Arc<AdvisoryLock>> {
        let path = KeyPath::parse(key);
        if path.is_root() {
            return Err(TreeError::expected_terminal(key));
        }
        Ok(self.latch(&path, path.segments())?.lock())
    }

    /// Read-latch the node reached by `segments`.
    fn latch(&self, path: &KeyPath<'_>, segments: &[&str]) -> TreeResult<ReadLatch> {
        let mut latch = self.root.read_arc();
        for (depth, segment) in segments.iter().enumerate() {
            let next = step(&latch, path, depth, segment)?;
            latch = next.read_arc();
        }
        Ok(latch)
    }

    /// Write-latch the node reached by `segments`, read-latching its ancestors.
    fn latch_mut(&self, path: &KeyPath<'_>, segments: &[&str]) -> TreeResult<WriteLatch> {
        let Some((last, ancestors)) = segments.split_last() else {
            return Ok(self.root.write_arc());
        };
        let parent = self.latch(path, ancestors)?;
        let next = step(&parent, path, ancestors.len(), last)?;
        let latch = next.write_arc();
        drop(parent);
        Ok(latch)
    }
}

/// Resolve the child `segment` of `node`, which sits at `depth` in `path`.
fn step(node: &Node, path: &KeyPath<'_>, depth: usize, segment: &str) -> TreeResult<NodeRef> {
    let children = node
        .children()
        .ok_or_else(|| TreeError::expected_directory(path.prefix_key(depth)))?;
    children
        .get(segment)
        .cloned()
        .ok_or_else(|| TreeError::not_found(path.to_string()))
}

impl Default for KeyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top_level = self
            .root
            .read()
            .children()
            .map_or(0, |children| children.len());
        f.debug_struct("KeyTree")
            .field("top_level_entries", &top_level)
            .finish()
    }
}
