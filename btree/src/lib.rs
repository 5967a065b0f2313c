// Life of a command:
// 1. The shell reads a menu choice (and its argument line) from input
// 2. The choice maps onto one tree operation:
//     - Insert keys -> BTree::insert_multiple -> BTree::insert per key
//     - Search      -> BTree::contains
//     - Traverse    -> BTree::traverse
// 3. The result is written back to output
//
// System components:
//  - B-tree core (nodes, arena, split/insert, traversal, invariant checks)
//  - Shell and its environment configuration
//  - Deterministic simulation harness
//
#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code so bad input never panics the shell.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod btree;
pub mod config;
pub mod shell;
pub mod simulation;

pub use btree::{BTree, BTreeError, Key};
