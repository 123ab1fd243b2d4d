//! Benchmark binary: loads the same N keys into a [`BTree`] (numeric
//! items) and into a plain hash-map store (stringified keys), and reports
//! wall-clock time for the bulk insert and for a single-key retrieval
//! against each.
//!
//! Run with:
//! ```bash
//! cargo run --release -- --keys 1000000
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use clap::Parser;

use cowtree::{BTree, Int};

/// Compare B-tree and hash-map load/lookup times over N keys.
#[derive(Parser, Debug)]
#[command(name = "cowtree", version)]
struct Args {
    /// Number of keys to load into each store.
    #[arg(short = 'n', long = "keys", value_name = "N")]
    keys: usize,

    /// B-tree degree.
    #[arg(short, long, default_value_t = 32)]
    degree: usize,
}

/// The comparison store: nothing but a hash map over stringified keys.
struct MapStore {
    entries: HashMap<String, String>,
}

impl MapStore {
    fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    fn set(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&String> {
        self.entries.get(key)
    }

    fn delete(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

fn timed<R>(run: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let out = run();
    (out, start.elapsed())
}

fn banner(label: &str) {
    println!("{}", "=".repeat(64));
    println!("{label}");
    println!("{}", "=".repeat(64));
}

fn main() {
    #[cfg(feature = "tracing")]
    cowtree::init_tracing();

    let args = Args::parse();
    let n = args.keys;
    #[expect(clippy::cast_possible_wrap)]
    let probe = n.saturating_sub(2) as i64;

    banner(&format!("map store ({n} keys)"));
    let mut map = MapStore::new();
    let ((), map_insert) = timed(|| {
        for i in 0..n {
            map.set(i.to_string(), i.to_string());
        }
    });
    println!("insert: {map_insert:?} ({} stored)", map.len());
    let probe_key = probe.to_string();
    let (found, map_get) = timed(|| map.get(&probe_key).is_some());
    println!("get {probe_key:?}: {map_get:?} (found: {found})");

    banner(&format!("btree store (degree {}, {n} keys)", args.degree));
    let mut tree: BTree<Int> = BTree::new(args.degree);
    let ((), tree_insert) = timed(|| {
        #[expect(clippy::cast_possible_wrap)]
        for i in 0..n as i64 {
            tree.replace_or_insert(Int(i));
        }
    });
    println!("insert: {tree_insert:?} ({} stored)", tree.len());
    let (found, tree_get) = timed(|| tree.get(&Int(probe)).is_some());
    println!("get {probe}: {tree_get:?} (found: {found})");
}
