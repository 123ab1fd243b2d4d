//! # cowtree
//!
//! An in-memory, ordered B-tree with copy-on-write structural sharing
//! and a bounded free list of retired nodes.
//!
//! ## Design
//!
//! - Items fuse key and value into one unit compared through
//!   [`Item::less`], a strict total order supplied by the caller.
//! - [`BTree::clone_tree`] is O(1): both trees keep the same nodes, and
//!   each side's first write through a shared node copies just that node.
//!   Ownership is tracked per node by a context identity tag; a tree may
//!   mutate a node in place only while their tags match.
//! - Retired nodes flow to a bounded free list shared by every tree in a
//!   clone family, so write-heavy workloads recycle node storage instead
//!   of churning the allocator. The free list's mutex is the crate's only
//!   synchronization point.
//!
//! ## Concurrency
//!
//! Each tree is single-writer (`&mut self` on every mutation). Reads are
//! `&self` and never copy, so a tree and its clones may be read from many
//! threads at once; two clones may also be *written* concurrently, since
//! they share nothing but the lock-guarded free list.
//!
//! ## Example
//!
//! ```
//! use cowtree::{BTree, Int};
//!
//! let mut tree = BTree::new(16);
//! for i in 0..100 {
//!     tree.replace_or_insert(Int(i));
//! }
//!
//! let mut evens = Vec::new();
//! tree.ascend_range(&Int(10), &Int(20), |item| {
//!     if item.0 % 2 == 0 {
//!         evens.push(item.0);
//!     }
//!     true
//! });
//! assert_eq!(evens, vec![10, 12, 14, 16, 18]);
//! ```

pub mod freelist;
pub mod item;
pub mod tree;

mod cow;
mod iter;
mod node;
mod trace;

pub use freelist::{DEFAULT_FREELIST_SIZE, FreeList};
pub use item::{Int, Item};
pub use tree::BTree;

/// Install a console `tracing` subscriber honoring `RUST_LOG`.
///
/// Intended for binaries and ad-hoc debugging; safe to call more than
/// once (later calls are ignored by the registry).
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .compact()
        .try_init();
}
