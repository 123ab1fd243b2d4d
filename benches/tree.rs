//! Benchmarks for `BTree` using Divan.
//!
//! Run with: `cargo bench --bench tree`

use cowtree::{BTree, Int};
use divan::{Bencher, black_box};
use rand::seq::SliceRandom;

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[1_000, 100_000];

fn sequential(n: usize) -> Vec<i64> {
    #[expect(clippy::cast_possible_wrap)]
    let n = n as i64;
    (0..n).collect()
}

fn shuffled(n: usize) -> Vec<i64> {
    let mut keys = sequential(n);
    keys.shuffle(&mut rand::rng());
    keys
}

fn populated(keys: &[i64]) -> BTree<Int> {
    let mut tree = BTree::new(32);
    for &k in keys {
        tree.replace_or_insert(Int(k));
    }
    tree
}

// =============================================================================
// Insert
// =============================================================================

#[divan::bench_group]
mod insert {
    use super::{Bencher, BTree, Int, SIZES, sequential, shuffled};

    #[divan::bench(args = SIZES)]
    fn sequential_keys(bencher: Bencher, n: usize) {
        let keys = sequential(n);
        bencher.bench_local(|| {
            let mut tree = BTree::new(32);
            for &k in &keys {
                tree.replace_or_insert(Int(k));
            }
            tree.len()
        });
    }

    #[divan::bench(args = SIZES)]
    fn shuffled_keys(bencher: Bencher, n: usize) {
        let keys = shuffled(n);
        bencher.bench_local(|| {
            let mut tree = BTree::new(32);
            for &k in &keys {
                tree.replace_or_insert(Int(k));
            }
            tree.len()
        });
    }

    /// Rebuild into a tree whose free list was primed by a cleared
    /// predecessor.
    #[divan::bench(args = SIZES)]
    fn recycled_nodes(bencher: Bencher, n: usize) {
        let keys = sequential(n);
        bencher
            .with_inputs(|| {
                let mut tree = super::populated(&keys);
                tree.clear(true);
                tree
            })
            .bench_local_values(|mut tree| {
                for &k in &keys {
                    tree.replace_or_insert(Int(k));
                }
                tree
            });
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[divan::bench_group]
mod get {
    use super::{Bencher, Int, SIZES, black_box, populated, sequential};

    #[divan::bench(args = SIZES)]
    fn point_lookup(bencher: Bencher, n: usize) {
        let tree = populated(&sequential(n));
        let mut probe = 0i64;
        bencher.bench_local(move || {
            #[expect(clippy::cast_possible_wrap)]
            let modulus = n as i64;
            probe = (probe + 7) % modulus;
            tree.get(black_box(&Int(probe))).is_some()
        });
    }

    #[divan::bench(args = SIZES)]
    fn missing_lookup(bencher: Bencher, n: usize) {
        let tree = populated(&sequential(n));
        bencher.bench_local(|| tree.get(black_box(&Int(-1))).is_some());
    }
}

// =============================================================================
// Clone and diverge
// =============================================================================

#[divan::bench_group]
mod clone {
    use super::{Bencher, Int, SIZES, populated, sequential};

    #[divan::bench(args = SIZES)]
    fn clone_only(bencher: Bencher, n: usize) {
        bencher
            .with_inputs(|| populated(&sequential(n)))
            .bench_local_values(|mut tree| {
                let snapshot = tree.clone_tree();
                (tree, snapshot)
            });
    }

    /// First writes after a clone pay the per-node copy cost.
    #[divan::bench(args = SIZES)]
    fn clone_then_write_hundred(bencher: Bencher, n: usize) {
        bencher
            .with_inputs(|| populated(&sequential(n)))
            .bench_local_values(|mut tree| {
                let mut snapshot = tree.clone_tree();
                for k in 0..100 {
                    snapshot.replace_or_insert(Int(-k));
                }
                (tree, snapshot)
            });
    }
}

// =============================================================================
// Iteration
// =============================================================================

#[divan::bench_group]
mod iterate {
    use super::{Bencher, Int, SIZES, black_box, populated, sequential};

    #[divan::bench(args = SIZES)]
    fn full_ascend(bencher: Bencher, n: usize) {
        let tree = populated(&sequential(n));
        bencher.bench_local(|| {
            let mut sum = 0i64;
            tree.ascend(|item| {
                sum += item.0;
                true
            });
            black_box(sum)
        });
    }

    #[divan::bench(args = SIZES)]
    fn bounded_window(bencher: Bencher, n: usize) {
        let tree = populated(&sequential(n));
        #[expect(clippy::cast_possible_wrap)]
        let mid = (n / 2) as i64;
        bencher.bench_local(|| {
            let mut count = 0usize;
            tree.ascend_range(&Int(mid), &Int(mid + 100), |_| {
                count += 1;
                true
            });
            black_box(count)
        });
    }
}
