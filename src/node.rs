//! B-tree node: a bounded run of sorted items, child links, and the
//! split/steal/merge machinery that keeps every node within its fill
//! bounds during inserts and deletes.
//!
//! All write paths run on nodes already made mutable for the writing
//! tree's context (see [`mutable_for`]); the algorithms here assume that
//! and never check again.

use std::sync::Arc;

use crate::cow::CowContext;
use crate::item::Item;
use crate::trace::{debug_log, trace_log};

/// Shared handle to a node. Trees holding different contexts may share
/// these freely; only the context stamped into the node grants writes.
pub(crate) type NodeRef<T> = Arc<Node<T>>;

/// A single tree node.
///
/// # Invariants
/// - `children` is empty (leaf) or holds exactly `items.len() + 1` links.
/// - `items` is strictly increasing under [`Item::less`].
/// - Every item in `children[i]` sorts before `items[i]`; every item in
///   `children[i + 1]` sorts after it.
/// - Non-root nodes hold between `degree - 1` and `2 * degree - 1` items.
pub(crate) struct Node<T: Item> {
    pub(crate) items: Vec<T>,
    pub(crate) children: Vec<NodeRef<T>>,
    pub(crate) owner: Option<CowContext<T>>,
}

/// What a `remove` descent is looking for.
pub(crate) enum Removal<'a, T> {
    /// The item equal to the given key under the order.
    ByKey(&'a T),
    /// The smallest item of the subtree.
    Min,
    /// The largest item of the subtree.
    Max,
}

// Manual impls: the derive would demand `T: Copy`, but only the borrow is
// copied here.
impl<T> Clone for Removal<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Removal<'_, T> {}

/// Binary search over a sorted item run.
///
/// Returns the index where `key` belongs and whether the item already at
/// that index equals it. The probe locates the first index whose item
/// sorts strictly after `key`; equality is then detected by inspecting
/// the predecessor, which keeps every equality decision in this one
/// place and costs a single extra comparator call.
pub(crate) fn search<T: Item>(items: &[T], key: &T) -> (usize, bool) {
    let i = items.partition_point(|it| !key.less(it));
    if i > 0 && !items[i - 1].less(key) {
        (i - 1, true)
    } else {
        (i, false)
    }
}

/// Mutable access to a node known to be exclusively held.
///
/// A node stamped with a live context is reachable only through the one
/// tree currently holding that context, so its reference count is one.
/// The same holds for nodes parked on (or just popped from) the free
/// list.
#[expect(clippy::expect_used, reason = "violation is an ownership-discipline bug")]
pub(crate) fn owned_mut<T: Item>(node: &mut NodeRef<T>) -> &mut Node<T> {
    Arc::get_mut(node).expect("node stamped with a live context must be uniquely referenced")
}

/// Produce a node the given context may mutate: the node itself on an
/// identity match, otherwise a fresh copy of its items and child links.
/// Children are not cloned here; each is unshared lazily if and when a
/// write descends into it.
pub(crate) fn mutable_for<T: Item>(node: NodeRef<T>, ctx: &CowContext<T>) -> NodeRef<T> {
    if node.is_owned_by(ctx) {
        return node;
    }

    let mut fresh = ctx.new_node();
    let out = owned_mut(&mut fresh);
    out.items.extend(node.items.iter().cloned());
    out.children.extend(node.children.iter().cloned());
    fresh
}

impl<T: Item> Node<T> {
    /// A node with no items, no children, and no owner.
    pub(crate) fn empty() -> Self {
        Self {
            items: Vec::new(),
            children: Vec::new(),
            owner: None,
        }
    }

    /// Whether this node was authored under `ctx`.
    pub(crate) fn is_owned_by(&self, ctx: &CowContext<T>) -> bool {
        self.owner.as_ref().is_some_and(|owner| CowContext::same(owner, ctx))
    }

    #[expect(clippy::expect_used, reason = "write paths run on stamped nodes only")]
    fn owner_context(&self) -> CowContext<T> {
        self.owner
            .clone()
            .expect("node on a write path carries its tree's context")
    }

    /// Replace `children[i]` with a copy this node's context may mutate,
    /// and hand it back. After this call the parent always links a child
    /// it is allowed to write through.
    pub(crate) fn mutable_child(&mut self, i: usize) -> &mut Node<T> {
        let ctx = self.owner_context();
        self.children[i] = mutable_for(Arc::clone(&self.children[i]), &ctx);
        owned_mut(&mut self.children[i])
    }

    /// Split at `i`: detach `items[i]` and move everything after it (and
    /// the child links after position `i`, when internal) into a new
    /// right sibling allocated under this node's context.
    pub(crate) fn split(&mut self, i: usize) -> (T, NodeRef<T>) {
        let ctx = self.owner_context();
        let mut sibling = ctx.new_node();
        let next = owned_mut(&mut sibling);
        next.items.extend(self.items.drain(i + 1..));
        if !self.children.is_empty() {
            next.children.extend(self.children.drain(i + 1..));
        }
        let item = self.items.pop().unwrap_or_else(|| unreachable!("split index in bounds"));
        (item, sibling)
    }

    /// Split `children[i]` if it is full, hoisting the middle item into
    /// this node. Returns whether a split happened.
    pub(crate) fn maybe_split_child(&mut self, i: usize, max_items: usize) -> bool {
        if self.children[i].items.len() < max_items {
            return false;
        }

        trace_log!(index = i, "splitting full child");
        let first = self.mutable_child(i);
        let (item, second) = first.split(max_items / 2);
        self.items.insert(i, item);
        self.children.insert(i + 1, second);
        true
    }

    /// Insert into the subtree rooted here, keeping every node at or
    /// below `max_items`. Returns the displaced item when an equal one
    /// was already present.
    ///
    /// On entry this node has room for one more item; the caller has
    /// already split it if it was full.
    pub(crate) fn insert(&mut self, item: T, max_items: usize) -> Option<T> {
        let (mut i, found) = search(&self.items, &item);
        if found {
            return Some(std::mem::replace(&mut self.items[i], item));
        }
        if self.children.is_empty() {
            self.items.insert(i, item);
            return None;
        }

        if self.maybe_split_child(i, max_items) {
            // The hoisted middle now sits at `i`; re-aim around it.
            if item.less(&self.items[i]) {
                // left half keeps the slot
            } else if self.items[i].less(&item) {
                i += 1;
            } else {
                return Some(std::mem::replace(&mut self.items[i], item));
            }
        }
        self.mutable_child(i).insert(item, max_items)
    }

    /// Find the stored item equal to `key` under the order, if any. The
    /// returned item may differ from `key` in whatever payload the order
    /// ignores.
    pub(crate) fn get(&self, key: &T) -> Option<&T> {
        let (i, found) = search(&self.items, key);
        if found {
            Some(&self.items[i])
        } else if let Some(child) = self.children.get(i) {
            child.get(key)
        } else {
            None
        }
    }

    /// Smallest item of the subtree rooted here.
    pub(crate) fn min(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node.items.first()
    }

    /// Largest item of the subtree rooted here.
    pub(crate) fn max(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.last() {
            node = child;
        }
        node.items.last()
    }

    /// Remove the requested item from the subtree rooted here.
    ///
    /// On entry this node holds more than `min_items` items or is the
    /// root; [`Self::grow_child_and_remove`] restores that invariant for
    /// each child before the descent continues into it.
    pub(crate) fn remove(&mut self, removal: Removal<'_, T>, min_items: usize) -> Option<T> {
        let (i, found) = match removal {
            Removal::Max => {
                if self.children.is_empty() {
                    return self.items.pop();
                }
                (self.items.len(), false)
            }

            Removal::Min => {
                if self.children.is_empty() {
                    return Some(self.items.remove(0));
                }
                (0, false)
            }

            Removal::ByKey(key) => {
                let (i, found) = search(&self.items, key);
                if self.children.is_empty() {
                    return found.then(|| self.items.remove(i));
                }
                (i, found)
            }
        };

        if self.children[i].items.len() <= min_items {
            return self.grow_child_and_remove(i, removal, min_items);
        }

        if found {
            // The match sits here; swap in its predecessor, pulled from
            // the left subtree, which can spare an item.
            let child = self.mutable_child(i);
            let predecessor = child.remove(Removal::Max, min_items)?;
            return Some(std::mem::replace(&mut self.items[i], predecessor));
        }
        self.mutable_child(i).remove(removal, min_items)
    }

    /// Bring `children[i]` above `min_items` items — stealing from a
    /// sibling through the parent separator, or merging with the right
    /// sibling — then retry the removal from this node. The retry always
    /// descends, because the chosen child now has an item to spare.
    fn grow_child_and_remove(
        &mut self,
        mut i: usize,
        removal: Removal<'_, T>,
        min_items: usize,
    ) -> Option<T> {
        if i > 0 && self.children[i - 1].items.len() > min_items {
            debug_log!(index = i, "stealing from left sibling");
            self.mutable_child(i);
            self.mutable_child(i - 1);
            let (left, right) = self.children.split_at_mut(i);
            let steal_from = owned_mut(&mut left[i - 1]);
            let child = owned_mut(&mut right[0]);

            let stolen = steal_from.items.pop()?;
            let separator = std::mem::replace(&mut self.items[i - 1], stolen);
            child.items.insert(0, separator);
            if let Some(grandchild) = steal_from.children.pop() {
                child.children.insert(0, grandchild);
            }
        } else if i < self.items.len() && self.children[i + 1].items.len() > min_items {
            debug_log!(index = i, "stealing from right sibling");
            self.mutable_child(i);
            self.mutable_child(i + 1);
            let (left, right) = self.children.split_at_mut(i + 1);
            let child = owned_mut(&mut left[i]);
            let steal_from = owned_mut(&mut right[0]);

            let stolen = steal_from.items.remove(0);
            let separator = std::mem::replace(&mut self.items[i], stolen);
            child.items.push(separator);
            if !steal_from.children.is_empty() {
                child.children.push(steal_from.children.remove(0));
            }
        } else {
            if i >= self.items.len() {
                i -= 1;
            }
            debug_log!(index = i, "merging with right sibling");
            self.mutable_child(i);
            let separator = self.items.remove(i);
            let absorbed = self.children.remove(i + 1);
            let ctx = self.owner_context();

            let child = owned_mut(&mut self.children[i]);
            child.items.push(separator);
            child.items.extend(absorbed.items.iter().cloned());
            child.children.extend(absorbed.children.iter().cloned());
            ctx.free_node(absorbed);
        }

        self.remove(removal, min_items)
    }
}

/// Postorder release of a whole subtree into the free list.
///
/// Returns whether the caller should keep releasing: the walk stops the
/// first time the free list reports full, since past that point the only
/// thing further descent could accomplish is already done. Nodes owned by
/// other trees are walked but left intact.
pub(crate) fn reset<T: Item>(mut node: NodeRef<T>, ctx: &CowContext<T>) -> bool {
    use crate::cow::FreeDisposition;

    if node.is_owned_by(ctx) {
        let n = owned_mut(&mut node);
        for child in n.children.drain(..) {
            if !reset(child, ctx) {
                return false;
            }
        }
    } else {
        for child in &node.children {
            if !reset(Arc::clone(child), ctx) {
                return false;
            }
        }
    }
    ctx.free_node(node) != FreeDisposition::FreelistFull
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cow::CowContext;
    use crate::freelist::FreeList;
    use crate::item::Int;

    fn context() -> CowContext<Int> {
        CowContext::new(Arc::new(FreeList::default()))
    }

    fn leaf(ctx: &CowContext<Int>, values: &[i64]) -> NodeRef<Int> {
        let mut node = ctx.new_node();
        owned_mut(&mut node).items.extend(values.iter().copied().map(Int));
        node
    }

    #[test]
    fn test_search_empty() {
        assert_eq!(search::<Int>(&[], &Int(5)), (0, false));
    }

    #[test]
    fn test_search_positions() {
        let items: Vec<Int> = [1, 3, 5, 7].into_iter().map(Int).collect();

        assert_eq!(search(&items, &Int(0)), (0, false));
        assert_eq!(search(&items, &Int(1)), (0, true));
        assert_eq!(search(&items, &Int(4)), (2, false));
        assert_eq!(search(&items, &Int(7)), (3, true));
        assert_eq!(search(&items, &Int(9)), (4, false));
    }

    #[test]
    fn test_mutable_for_identity_hit() {
        let ctx = context();
        let node = leaf(&ctx, &[1, 2]);

        let same = mutable_for(Arc::clone(&node), &ctx);
        assert!(Arc::ptr_eq(&node, &same));
    }

    #[test]
    fn test_mutable_for_clones_foreign() {
        let freelist = Arc::new(FreeList::default());
        let author: CowContext<Int> = CowContext::new(Arc::clone(&freelist));
        let other: CowContext<Int> = CowContext::new(freelist);

        let node = leaf(&author, &[1, 2]);
        let copy = mutable_for(Arc::clone(&node), &other);

        assert!(!Arc::ptr_eq(&node, &copy));
        assert!(copy.is_owned_by(&other));
        assert_eq!(copy.items, node.items);
    }

    #[test]
    fn test_split_leaf() {
        let ctx = context();
        let mut node = leaf(&ctx, &[1, 2, 3, 4, 5]);

        let (middle, right) = owned_mut(&mut node).split(2);
        assert_eq!(middle, Int(3));
        assert_eq!(node.items, vec![Int(1), Int(2)]);
        assert_eq!(right.items, vec![Int(4), Int(5)]);
        assert!(right.is_owned_by(&ctx));
    }

    #[test]
    fn test_split_internal_moves_children() {
        let ctx = context();
        let mut node = leaf(&ctx, &[10, 20, 30]);
        {
            let n = owned_mut(&mut node);
            for low in [0, 11, 21, 31] {
                n.children.push(leaf(&ctx, &[low + 1, low + 2]));
            }
        }

        let (middle, right) = owned_mut(&mut node).split(1);
        assert_eq!(middle, Int(20));
        assert_eq!(node.items, vec![Int(10)]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(right.items, vec![Int(30)]);
        assert_eq!(right.children.len(), 2);
    }

    #[test]
    fn test_leaf_insert_keeps_order() {
        let ctx = context();
        let mut node = leaf(&ctx, &[2, 6]);

        let n = owned_mut(&mut node);
        assert!(n.insert(Int(4), 7).is_none());
        assert!(n.insert(Int(1), 7).is_none());
        assert_eq!(n.insert(Int(4), 7), Some(Int(4)));
        assert_eq!(n.items, vec![Int(1), Int(2), Int(4), Int(6)]);
    }
}
