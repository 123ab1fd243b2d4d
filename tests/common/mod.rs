//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ...
//! }
//! ```
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=cowtree=debug`) to see structural
//! events when the crate is built with `--features tracing`.

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a console tracing subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .compact()
            .try_init();
    });
}

/// Collect a tree's full ascending traversal as raw integers.
pub fn ascending(tree: &cowtree::BTree<cowtree::Int>) -> Vec<i64> {
    let mut out = Vec::new();
    tree.ascend(|item| {
        out.push(item.0);
        true
    });
    out
}

/// Collect a tree's full descending traversal as raw integers.
pub fn descending(tree: &cowtree::BTree<cowtree::Int>) -> Vec<i64> {
    let mut out = Vec::new();
    tree.descend(|item| {
        out.push(item.0);
        true
    });
    out
}
