//! Structural invariant checks for a B-tree.
//!
//! Used by the simulation harness after every insert and by unit tests. A
//! healthy tree produces no violations.
//!
//! Checked invariants:
//! - keys within a node are non-decreasing
//! - every key in child `i` lies between separator keys `i - 1` and `i`
//!   (inclusive, since duplicates of a promoted median may sit on either side)
//! - no node holds more than `2t - 1` keys; internal nodes have `n + 1` children
//! - non-root nodes hold at least `t - 1` keys; the root holds at least one
//! - all leaves sit at the same depth, equal to the recorded height
//! - every allocated node is reachable from the root exactly once
//! - the recorded key count matches the keys actually stored

use super::node::{Key, NodeId};
use super::tree::BTree;

/// An invariant violation found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// The node where it was detected, if it is tied to one.
    pub node: Option<NodeId>,
    /// Additional context.
    pub context: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node {
            Some(node) => write!(f, "{} at node {node}: {}", self.description, self.context),
            None => write!(f, "{}: {}", self.description, self.context),
        }
    }
}

/// State carried through the recursive walk.
struct Walk {
    violations: Vec<InvariantViolation>,
    visited: Vec<bool>,
    leaf_depth: Option<usize>,
    key_count: usize,
}

impl Walk {
    fn violation(&mut self, description: &str, node: Option<NodeId>, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_owned(),
            node,
            context,
        });
    }
}

impl BTree {
    /// Check every structural invariant and return the violations found.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut walk = Walk {
            violations: Vec::new(),
            visited: vec![false; self.node_count()],
            leaf_depth: None,
            key_count: 0,
        };

        let Some(root) = self.root() else {
            if self.len() != 0 || self.height() != 0 || self.node_count() != 0 {
                walk.violation(
                    "Empty tree has leftover state",
                    None,
                    format!(
                        "len {}, height {}, nodes {}",
                        self.len(),
                        self.height(),
                        self.node_count()
                    ),
                );
            }
            return walk.violations;
        };

        self.check_node(root, 1, None, None, &mut walk);

        if let Some(depth) = walk.leaf_depth {
            if depth != self.height() {
                walk.violation(
                    "Leaf depth differs from recorded height",
                    None,
                    format!("leaves at depth {depth}, height {}", self.height()),
                );
            }
        }

        let unreachable = walk.visited.iter().filter(|seen| !**seen).count();
        if unreachable > 0 {
            walk.violation(
                "Allocated nodes are unreachable from the root",
                None,
                format!("{unreachable} of {} nodes", self.node_count()),
            );
        }

        if walk.key_count != self.len() {
            walk.violation(
                "Stored key count differs from recorded length",
                None,
                format!("found {}, recorded {}", walk.key_count, self.len()),
            );
        }

        walk.violations
    }

    fn check_node(
        &self,
        id: NodeId,
        depth: usize,
        lower: Option<Key>,
        upper: Option<Key>,
        walk: &mut Walk,
    ) {
        let Some(node) = self.node(id) else {
            walk.violation("Child handle out of range", Some(id), String::new());
            return;
        };
        if std::mem::replace(&mut walk.visited[id.index()], true) {
            walk.violation("Node reachable from more than one parent", Some(id), String::new());
            return;
        }

        let degree = self.min_degree();
        let keys = node.keys();
        walk.key_count += keys.len();

        if keys.len() > degree.max_keys() {
            walk.violation(
                "Node has too many keys",
                Some(id),
                format!("{} keys, max {}", keys.len(), degree.max_keys()),
            );
        }
        let is_root = self.root() == Some(id);
        let min_keys = if is_root { 1 } else { degree.min_keys() };
        if keys.len() < min_keys {
            walk.violation(
                "Node has too few keys",
                Some(id),
                format!("{} keys, min {min_keys}", keys.len()),
            );
        }

        if let Some(pair) = keys.windows(2).find(|pair| pair[0] > pair[1]) {
            walk.violation(
                "Keys out of order",
                Some(id),
                format!("{} before {}", pair[0], pair[1]),
            );
        }

        let below = lower.and_then(|low| keys.iter().find(|k| **k < low));
        let above = upper.and_then(|high| keys.iter().find(|k| **k > high));
        if let Some(key) = below.or(above) {
            walk.violation(
                "Key outside the range set by its parent",
                Some(id),
                format!("key {key}, range {lower:?}..={upper:?}"),
            );
        }

        if node.is_leaf() {
            if !node.children().is_empty() {
                walk.violation(
                    "Leaf has children",
                    Some(id),
                    format!("{} children", node.children().len()),
                );
            }
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => walk.violation(
                    "Leaves at different depths",
                    Some(id),
                    format!("depth {depth}, expected {expected}"),
                ),
                Some(_) => {}
            }
            return;
        }

        if node.children().len() != keys.len() + 1 {
            walk.violation(
                "Internal node child count mismatch",
                Some(id),
                format!("{} keys, {} children", keys.len(), node.children().len()),
            );
            return;
        }

        for (i, &child) in node.children().iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(keys[i - 1]) };
            let child_upper = keys.get(i).copied().or(upper);
            self.check_node(child, depth + 1, child_lower, child_upper, walk);
        }
    }
}
