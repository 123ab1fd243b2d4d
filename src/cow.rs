//! Copy-on-write ownership context.
//!
//! Every node is stamped with the context that authored it. A tree may
//! mutate a node in place only while its current context matches the
//! node's stamp; anything else is a shared view that must be cloned
//! before the first write. [`BTree::clone_tree`](crate::BTree::clone_tree)
//! mints two fresh contexts over the shared free list, which instantly
//! turns every existing node into such a view for both sides.
//!
//! Contexts compare by identity, never by contents: a freshly minted
//! context is distinct from every other even though it wraps the same
//! free list.

use std::sync::Arc;

use crate::freelist::FreeList;
use crate::item::Item;
use crate::node::{NodeRef, owned_mut};
use crate::trace::trace_log;

/// Outcome of releasing a node through [`CowContext::free_node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FreeDisposition {
    /// The node is stamped with another context and was left untouched.
    /// This is how subgraphs shared with sibling trees survive a delete.
    NotOwned,

    /// The node was cleared and parked on the free list.
    Stored,

    /// The node was cleared but the free list was full; it is dropped.
    FreelistFull,
}

/// Identity tag deciding which tree may mutate a node in place.
///
/// Cheap to clone (one `Arc` bump); clones share the same identity.
pub(crate) struct CowContext<T: Item> {
    inner: Arc<ContextInner<T>>,
}

struct ContextInner<T: Item> {
    freelist: Arc<FreeList<T>>,
}

impl<T: Item> CowContext<T> {
    /// Mint a fresh identity over the given free list.
    pub(crate) fn new(freelist: Arc<FreeList<T>>) -> Self {
        Self {
            inner: Arc::new(ContextInner { freelist }),
        }
    }

    /// The free list this context draws from and retires into.
    pub(crate) fn freelist(&self) -> &Arc<FreeList<T>> {
        &self.inner.freelist
    }

    /// Whether two handles name the same context. Identity compare only.
    pub(crate) fn same(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Acquire a node from the free list and stamp it as owned by `self`.
    pub(crate) fn new_node(&self) -> NodeRef<T> {
        let mut node = self.inner.freelist.acquire();
        owned_mut(&mut node).owner = Some(self.clone());
        node
    }

    /// Release a node, with the three-way disposition documented on
    /// [`FreeDisposition`].
    ///
    /// An owned node is cleared (items and children truncated, owner
    /// removed) before the push so the free list never extends the
    /// reachability of item graphs beyond their tree.
    pub(crate) fn free_node(&self, mut node: NodeRef<T>) -> FreeDisposition {
        if !node.is_owned_by(self) {
            return FreeDisposition::NotOwned;
        }

        {
            let n = owned_mut(&mut node);
            n.items.clear();
            n.children.clear();
            n.owner = None;
        }

        if self.inner.freelist.release(node) {
            FreeDisposition::Stored
        } else {
            trace_log!("free list full, dropping retired node");
            FreeDisposition::FreelistFull
        }
    }
}

impl<T: Item> Clone for CowContext<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Int;

    fn context(capacity: usize) -> CowContext<Int> {
        CowContext::new(Arc::new(FreeList::new(capacity)))
    }

    #[test]
    fn test_identity_not_structure() {
        let freelist = Arc::new(FreeList::new(4));
        let a: CowContext<Int> = CowContext::new(Arc::clone(&freelist));
        let b: CowContext<Int> = CowContext::new(freelist);

        assert!(CowContext::same(&a, &a.clone()));
        assert!(!CowContext::same(&a, &b));
    }

    #[test]
    fn test_new_node_is_stamped() {
        let ctx = context(4);

        let node = ctx.new_node();
        assert!(node.is_owned_by(&ctx));
        assert!(node.items.is_empty());
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_free_node_stores_owned() {
        let ctx = context(4);
        let mut node = ctx.new_node();
        owned_mut(&mut node).items.push(Int(1));

        assert_eq!(ctx.free_node(node), FreeDisposition::Stored);
        assert_eq!(ctx.freelist().len(), 1);

        // The parked node was cleared.
        let recycled = ctx.freelist().acquire();
        assert!(recycled.items.is_empty());
        assert!(recycled.owner.is_none());
    }

    #[test]
    fn test_free_node_ignores_foreign() {
        let freelist = Arc::new(FreeList::new(4));
        let author: CowContext<Int> = CowContext::new(Arc::clone(&freelist));
        let other: CowContext<Int> = CowContext::new(freelist);

        let node = author.new_node();
        assert_eq!(other.free_node(node), FreeDisposition::NotOwned);
        assert!(other.freelist().is_empty());
    }

    #[test]
    fn test_free_node_reports_full_list() {
        let ctx = context(1);
        let first = ctx.new_node();
        let second = ctx.new_node();

        assert_eq!(ctx.free_node(first), FreeDisposition::Stored);
        assert_eq!(ctx.free_node(second), FreeDisposition::FreelistFull);
        assert_eq!(ctx.freelist().len(), 1);
    }
}
