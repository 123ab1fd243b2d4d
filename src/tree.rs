//! `BTree` — the public entry points.
//!
//! This module owns the root bootstrap and collapse, the length counter,
//! and the copy-on-write plumbing that makes every write path run on
//! nodes the tree is allowed to mutate. The per-node algorithms live in
//! [`crate::node`]; the traversal lives in [`crate::iter`].

use std::fmt::Write as _;
use std::sync::Arc;

use crate::cow::CowContext;
use crate::freelist::FreeList;
use crate::item::Item;
use crate::iter::{Direction, Range};
use crate::node::{Node, NodeRef, Removal, mutable_for, owned_mut, reset};
use crate::trace::debug_log;

/// An ordered, in-memory B-tree over [`Item`]s with O(1) cloning.
///
/// Writes are `&mut self` — one writer at a time per tree. Reads never
/// mutate, so a tree and its clones may be read concurrently; the only
/// state shared between related trees is the bounded free list, which
/// serializes its own access.
///
/// # Example
///
/// ```
/// use cowtree::{BTree, Int};
///
/// let mut tree = BTree::new(3);
/// for i in 0..10 {
///     tree.replace_or_insert(Int(i));
/// }
/// assert_eq!(tree.len(), 10);
/// assert_eq!(tree.get(&Int(4)), Some(&Int(4)));
///
/// let snapshot = tree.clone_tree();
/// tree.delete(&Int(4));
/// assert!(snapshot.has(&Int(4)));
/// ```
pub struct BTree<T: Item> {
    degree: usize,
    length: usize,
    root: Option<NodeRef<T>>,
    cow: CowContext<T>,
}

impl<T: Item> BTree<T> {
    /// Create a tree with the given degree and a default-sized free list.
    ///
    /// Nodes hold between `degree - 1` and `2 * degree - 1` items (the
    /// root is exempt from the lower bound).
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`.
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self::with_free_list(degree, Arc::new(FreeList::default()))
    }

    /// Create a tree drawing from (and retiring into) the given free
    /// list.
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`.
    #[must_use]
    pub fn with_free_list(degree: usize, freelist: Arc<FreeList<T>>) -> Self {
        assert!(degree >= 2, "btree degree must be at least 2, got {degree}");

        Self {
            degree,
            length: 0,
            root: None,
            cow: CowContext::new(freelist),
        }
    }

    fn max_items(&self) -> usize {
        self.degree * 2 - 1
    }

    fn min_items(&self) -> usize {
        self.degree - 1
    }

    /// Add `item` to the tree. If an equal item (under the order) is
    /// already present it is replaced and handed back; otherwise `None`
    /// is returned and the length grows by one.
    pub fn replace_or_insert(&mut self, item: T) -> Option<T> {
        let Some(root) = self.root.take() else {
            let mut root = self.cow.new_node();
            owned_mut(&mut root).items.push(item);
            self.root = Some(root);
            self.length += 1;
            return None;
        };

        let mut root = mutable_for(root, &self.cow);
        if root.items.len() >= self.max_items() {
            debug_log!(len = self.length, "splitting root");
            let (middle, second) = owned_mut(&mut root).split(self.max_items() / 2);
            let mut new_root = self.cow.new_node();
            let top = owned_mut(&mut new_root);
            top.items.push(middle);
            top.children.push(root);
            top.children.push(second);
            root = new_root;
        }

        let displaced = owned_mut(&mut root).insert(item, self.max_items());
        self.root = Some(root);
        if displaced.is_none() {
            self.length += 1;
        }
        displaced
    }

    /// Remove and return the item equal to `key`, if present.
    pub fn delete(&mut self, key: &T) -> Option<T> {
        self.delete_item(Removal::ByKey(key))
    }

    /// Remove and return the smallest item, if any.
    pub fn delete_min(&mut self) -> Option<T> {
        self.delete_item(Removal::Min)
    }

    /// Remove and return the largest item, if any.
    pub fn delete_max(&mut self) -> Option<T> {
        self.delete_item(Removal::Max)
    }

    fn delete_item(&mut self, removal: Removal<'_, T>) -> Option<T> {
        let root = self.root.take()?;
        if root.items.is_empty() {
            self.root = Some(root);
            return None;
        }

        let mut root = mutable_for(root, &self.cow);
        let out = owned_mut(&mut root).remove(removal, self.min_items());

        if root.items.is_empty() && !root.children.is_empty() {
            // The root drained down to a single child; shed a level.
            debug_log!(len = self.length, "collapsing root");
            let mut old_root = root;
            root = owned_mut(&mut old_root).children.remove(0);
            self.cow.free_node(old_root);
        }

        self.root = Some(root);
        if out.is_some() {
            self.length -= 1;
        }
        out
    }

    /// Look up the stored item equal to `key` under the order.
    ///
    /// The returned item may differ from `key` in payload the order
    /// ignores — this is the read side of the fused key/value model.
    #[must_use]
    pub fn get(&self, key: &T) -> Option<&T> {
        self.root.as_ref()?.get(key)
    }

    /// Whether an item equal to `key` is present.
    #[must_use]
    pub fn has(&self, key: &T) -> bool {
        self.get(key).is_some()
    }

    /// The smallest item, if any.
    #[must_use]
    pub fn min(&self) -> Option<&T> {
        self.root.as_ref()?.min()
    }

    /// The largest item, if any.
    #[must_use]
    pub fn max(&self) -> Option<&T> {
        self.root.as_ref()?.max()
    }

    /// Number of items stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the tree holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Drop every item.
    ///
    /// With `return_to_free_list` set, nodes owned by this tree are
    /// released onto the free list until it fills, at which point the
    /// walk stops and the rest of the structure is simply dropped.
    /// Nodes shared with clones are never touched. With the flag off
    /// this is O(1).
    pub fn clear(&mut self, return_to_free_list: bool) {
        debug_log!(len = self.length, return_to_free_list, "clearing tree");
        if let Some(root) = self.root.take() {
            if return_to_free_list {
                reset(root, &self.cow);
            }
        }
        self.length = 0;
    }

    /// Lazily clone the tree in O(1).
    ///
    /// Both trees keep the same nodes; each side gets a fresh context
    /// over the shared free list, so the first write either side makes
    /// through a shared node copies that node rather than mutating it.
    /// Reads never copy. Not `impl Clone`: this retags the original's
    /// context, and `&mut self` is what keeps it from racing other
    /// operations on the original.
    #[must_use]
    pub fn clone_tree(&mut self) -> Self {
        let freelist = Arc::clone(self.cow.freelist());
        self.cow = CowContext::new(Arc::clone(&freelist));

        Self {
            degree: self.degree,
            length: self.length,
            root: self.root.clone(),
            cow: CowContext::new(freelist),
        }
    }

    /// Visit every item in ascending order until `visitor` returns
    /// `false`.
    pub fn ascend<F>(&self, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Ascending,
            Range { start: None, stop: None, include_start: false },
            &mut visitor,
        );
    }

    /// Visit every item in `[greater_or_equal, less_than)` in ascending
    /// order until `visitor` returns `false`.
    pub fn ascend_range<F>(&self, greater_or_equal: &T, less_than: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Ascending,
            Range {
                start: Some(greater_or_equal),
                stop: Some(less_than),
                include_start: true,
            },
            &mut visitor,
        );
    }

    /// Visit every item `>= pivot` in ascending order until `visitor`
    /// returns `false`.
    pub fn ascend_greater_or_equal<F>(&self, pivot: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Ascending,
            Range { start: Some(pivot), stop: None, include_start: true },
            &mut visitor,
        );
    }

    /// Visit every item `< pivot` in ascending order until `visitor`
    /// returns `false`.
    pub fn ascend_less_than<F>(&self, pivot: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Ascending,
            Range { start: None, stop: Some(pivot), include_start: false },
            &mut visitor,
        );
    }

    /// Visit every item in descending order until `visitor` returns
    /// `false`.
    pub fn descend<F>(&self, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Descending,
            Range { start: None, stop: None, include_start: false },
            &mut visitor,
        );
    }

    /// Visit every item from `less_or_equal` down to (but excluding)
    /// `greater_than`, in descending order, until `visitor` returns
    /// `false`.
    pub fn descend_range<F>(&self, less_or_equal: &T, greater_than: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Descending,
            Range {
                start: Some(less_or_equal),
                stop: Some(greater_than),
                include_start: true,
            },
            &mut visitor,
        );
    }

    /// Visit every item `<= pivot` in descending order until `visitor`
    /// returns `false`.
    pub fn descend_less_or_equal<F>(&self, pivot: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Descending,
            Range { start: Some(pivot), stop: None, include_start: true },
            &mut visitor,
        );
    }

    /// Visit every item `> pivot` in descending order until `visitor`
    /// returns `false`.
    pub fn descend_greater_than<F>(&self, pivot: &T, mut visitor: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.iterate(
            Direction::Descending,
            Range { start: None, stop: Some(pivot), include_start: false },
            &mut visitor,
        );
    }

    fn iterate<F>(&self, direction: Direction, range: Range<'_, T>, visitor: &mut F)
    where
        F: FnMut(&T) -> bool,
    {
        if let Some(root) = &self.root {
            root.iterate(direction, &range, false, visitor);
        }
    }

    /// Verify the structural invariants, returning a description of the
    /// first violation found. Debugging aid; tests call this after every
    /// mutation.
    ///
    /// Checked per node: child count (zero or `items + 1`), strict item
    /// order, and fill bounds (root exempt from the lower bound). Checked
    /// globally: the full in-order traversal is strictly increasing and
    /// its item count equals `len()`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the violated invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(root) = &self.root else {
            if self.length != 0 {
                return Err(format!("empty tree reports length {}", self.length));
            }
            return Ok(());
        };

        self.check_node(root, true)?;

        let mut traversed = 0usize;
        let mut previous: Option<T> = None;
        let mut error: Option<String> = None;
        self.ascend(|item| {
            traversed += 1;
            if let Some(prev) = &previous {
                if !prev.less(item) {
                    error = Some("in-order traversal is not strictly increasing".to_owned());
                    return false;
                }
            }
            previous = Some(item.clone());
            true
        });
        if let Some(error) = error {
            return Err(error);
        }
        if traversed != self.length {
            return Err(format!(
                "length {} disagrees with traversal count {traversed}",
                self.length,
            ));
        }
        Ok(())
    }

    fn check_node(&self, node: &Node<T>, is_root: bool) -> Result<(), String> {
        for pair in node.items.windows(2) {
            if !pair[0].less(&pair[1]) {
                return Err("node items out of order".to_owned());
            }
        }

        if !node.children.is_empty() && node.children.len() != node.items.len() + 1 {
            return Err(format!(
                "internal node has {} items but {} children",
                node.items.len(),
                node.children.len(),
            ));
        }

        if node.items.len() > self.max_items() {
            return Err(format!(
                "node holds {} items, above the maximum",
                node.items.len(),
            ));
        }
        if !is_root && node.items.len() < self.min_items() {
            return Err(format!(
                "node holds {} items, below the minimum",
                node.items.len(),
            ));
        }

        for child in &node.children {
            self.check_node(child, false)?;
        }
        Ok(())
    }
}

impl<T: Item + std::fmt::Debug> BTree<T> {
    /// Render the node structure, one line per node, indented by depth.
    /// Debugging aid.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = &self.root {
            Self::dump_node(root, 0, &mut out);
        }
        out
    }

    fn dump_node(node: &Node<T>, depth: usize, out: &mut String) {
        let _ = writeln!(out, "{:indent$}NODE:{:?}", "", node.items, indent = depth * 2);
        for child in &node.children {
            Self::dump_node(child, depth + 1, out);
        }
    }
}
