//! Bounded free list of retired nodes.
//!
//! Trees descended from a common ancestor share one free list, so a node
//! retired by one tree can be recycled by another. The list is a plain
//! LIFO stack behind a [`parking_lot::Mutex`]; the lock is held only for
//! the duration of a single push or pop, never across a tree operation.
//! This is the one synchronization point in the crate — each tree itself
//! is single-writer.

use parking_lot::Mutex;

use crate::item::Item;
use crate::node::{Node, NodeRef};

/// Capacity used by [`FreeList::default`] and [`BTree::new`](crate::BTree::new).
pub const DEFAULT_FREELIST_SIZE: usize = 32;

/// A bounded stack of retired nodes, shared between related trees.
///
/// The capacity caps the memory retained across clears and deletes; nodes
/// refused by a full list are simply dropped.
pub struct FreeList<T: Item> {
    nodes: Mutex<Vec<NodeRef<T>>>,
    capacity: usize,
}

impl<T: Item> FreeList<T> {
    /// Create a free list retaining at most `capacity` nodes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Number of nodes currently parked on the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Whether the list holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Pop the most recently pushed node, or allocate a fresh empty one.
    ///
    /// The returned node has no items, no children, and no owner; the
    /// caller stamps the owner before linking it into a tree.
    pub(crate) fn acquire(&self) -> NodeRef<T> {
        let recycled = self.nodes.lock().pop();
        recycled.unwrap_or_else(|| NodeRef::new(Node::empty()))
    }

    /// Push a retired node, returning whether it was kept.
    ///
    /// The list never retains references to a node's former items or
    /// children: the caller must have truncated both and cleared the
    /// owner before releasing, so parked nodes keep only their spare
    /// capacity alive.
    pub(crate) fn release(&self, node: NodeRef<T>) -> bool {
        debug_assert!(node.items.is_empty() && node.children.is_empty());

        let mut nodes = self.nodes.lock();
        if nodes.len() < self.capacity {
            nodes.push(node);
            true
        } else {
            false
        }
    }
}

impl<T: Item> Default for FreeList<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FREELIST_SIZE)
    }
}
