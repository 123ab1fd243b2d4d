//! Bounded in-order traversal, in both directions.
//!
//! One recursive walk serves all eight tree-level iterators. The `hit`
//! flag threads through the recursion to record whether the traversal has
//! passed its starting boundary; it exists solely so the inclusion policy
//! applies to the very first item equal to `start` and to nothing else.

use crate::item::Item;
use crate::node::{Node, search};

/// Traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Ascending,
    Descending,
}

/// Bounds for one traversal.
///
/// `start` names the first item to visit, subject to `include_start`;
/// `stop` is always exclusive in the direction of travel.
pub(crate) struct Range<'a, T: Item> {
    pub(crate) start: Option<&'a T>,
    pub(crate) stop: Option<&'a T>,
    pub(crate) include_start: bool,
}

impl<T: Item> Node<T> {
    /// Walk the subtree rooted here in the given direction, feeding each
    /// in-bounds item to `visitor` until it returns `false` or the items
    /// run out. Returns the threaded `hit` flag and whether the caller
    /// should keep going.
    pub(crate) fn iterate<F>(
        &self,
        direction: Direction,
        range: &Range<'_, T>,
        hit: bool,
        visitor: &mut F,
    ) -> (bool, bool)
    where
        F: FnMut(&T) -> bool,
    {
        match direction {
            Direction::Ascending => self.iterate_ascending(range, hit, visitor),

            Direction::Descending => self.iterate_descending(range, hit, visitor),
        }
    }

    fn iterate_ascending<F>(&self, range: &Range<'_, T>, mut hit: bool, visitor: &mut F) -> (bool, bool)
    where
        F: FnMut(&T) -> bool,
    {
        let first = match range.start {
            Some(start) => search(&self.items, start).0,
            None => 0,
        };

        for i in first..self.items.len() {
            if let Some(child) = self.children.get(i) {
                let (passed, keep_going) = child.iterate_ascending(range, hit, visitor);
                hit = passed;
                if !keep_going {
                    return (hit, false);
                }
            }

            let item = &self.items[i];
            if !range.include_start && !hit {
                if let Some(start) = range.start {
                    if !start.less(item) {
                        // Exactly the excluded starting item; step past it.
                        hit = true;
                        continue;
                    }
                }
            }
            hit = true;
            if let Some(stop) = range.stop {
                if !item.less(stop) {
                    return (hit, false);
                }
            }
            if !visitor(item) {
                return (hit, false);
            }
        }

        if let Some(last) = self.children.last() {
            let (passed, keep_going) = last.iterate_ascending(range, hit, visitor);
            hit = passed;
            if !keep_going {
                return (hit, false);
            }
        }
        (hit, true)
    }

    fn iterate_descending<F>(&self, range: &Range<'_, T>, mut hit: bool, visitor: &mut F) -> (bool, bool)
    where
        F: FnMut(&T) -> bool,
    {
        // Index of the largest item at or below `start`; `None` when every
        // local item is above it (or the node is empty).
        let first = match range.start {
            Some(start) => {
                let (i, found) = search(&self.items, start);
                if found { Some(i) } else { i.checked_sub(1) }
            }
            None => self.items.len().checked_sub(1),
        };

        if let Some(first) = first {
            for i in (0..=first).rev() {
                let item = &self.items[i];
                if let Some(start) = range.start {
                    if !item.less(start) {
                        if !range.include_start || hit || start.less(item) {
                            continue;
                        }
                    }
                }

                if let Some(child) = self.children.get(i + 1) {
                    let (passed, keep_going) = child.iterate_descending(range, hit, visitor);
                    hit = passed;
                    if !keep_going {
                        return (hit, false);
                    }
                }

                if let Some(stop) = range.stop {
                    if !stop.less(item) {
                        return (hit, false);
                    }
                }
                hit = true;
                if !visitor(item) {
                    return (hit, false);
                }
            }
        }

        if let Some(child) = self.children.first() {
            let (passed, keep_going) = child.iterate_descending(range, hit, visitor);
            hit = passed;
            if !keep_going {
                return (hit, false);
            }
        }
        (hit, true)
    }
}
