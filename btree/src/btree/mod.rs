//! In-memory B-tree over integer keys.
//!
//! # Structure
//!
//! The tree is parameterized by a minimum degree `t >= 2`:
//! - every node holds at most `2t - 1` keys, sorted ascending
//! - every node except the root holds at least `t - 1` keys
//! - internal nodes with `n` keys have exactly `n + 1` children
//! - all leaves are at the same depth
//!
//! Nodes live in an arena owned by the tree and refer to their children by
//! `NodeId`. Each node has exactly one parent; nothing is ever freed while
//! the tree is alive.
//!
//! # Usage
//!
//! ```
//! use btree::btree::BTree;
//!
//! let mut tree = BTree::new(3).expect("t >= 2");
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     tree.insert(key).expect("insert");
//! }
//!
//! assert_eq!(tree.traverse(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
//! assert!(tree.contains(12));
//! assert!(!tree.contains(99));
//! ```

mod arena;
mod invariants;
mod node;
mod tree;

pub use invariants::InvariantViolation;
pub use node::{Key, Node, NodeError, NodeId, NodeType};
pub use tree::{AllocationFailure, BTree, BTreeError, BulkInsert, MinDegree, SearchHit};
