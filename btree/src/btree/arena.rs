//! Bump allocator for B-tree nodes.
//!
//! Nodes are appended and never freed while the tree lives, so there is no
//! free list: a `NodeId` is simply the node's position in allocation order.
//! An optional node budget caps how many nodes may ever be allocated, which
//! is how callers bound memory use (and how tests inject allocation failure).

use super::node::{Node, NodeId};
use super::tree::{AllocationFailure, BTreeError};

#[derive(Debug)]
pub(super) struct NodeArena {
    nodes: Vec<Node>,
    /// Maximum number of nodes this arena will hold. `None` means unbounded.
    limit: Option<usize>,
}

impl NodeArena {
    pub(super) const fn new(limit: Option<usize>) -> Self {
        Self {
            nodes: Vec::new(),
            limit,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Make room for `additional` more nodes.
    ///
    /// After this succeeds, that many `push` calls neither fail the budget
    /// nor reallocate.
    pub(super) fn reserve(&mut self, additional: usize) -> Result<(), BTreeError> {
        if let Some(limit) = self.limit {
            let available = limit.saturating_sub(self.nodes.len());
            if additional > available {
                return Err(BTreeError::AllocationFailure(
                    AllocationFailure::NodeBudget {
                        requested: additional,
                        available,
                    },
                ));
            }
        }

        self.nodes
            .try_reserve(additional)
            .map_err(|_| BTreeError::AllocationFailure(AllocationFailure::OutOfMemory))
    }

    /// Append a node. Call `reserve` first.
    pub(super) fn push(&mut self, node: Node) -> NodeId {
        debug_assert!(
            self.limit.is_none_or(|limit| self.nodes.len() < limit),
            "node pushed past the arena budget without a reservation"
        );
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(super) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(super) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::node::NodeType;
    use crate::btree::tree::MinDegree;

    fn leaf() -> Node {
        Node::new(NodeType::Leaf, MinDegree::new(2).expect("degree")).expect("leaf")
    }

    #[test]
    fn test_push_assigns_sequential_ids() {
        let mut arena = NodeArena::new(None);
        arena.reserve(2).expect("reserve");
        let a = arena.push(leaf());
        let b = arena.push(leaf());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(NodeId(2)).is_none());
    }

    #[test]
    fn test_reserve_respects_budget() {
        let mut arena = NodeArena::new(Some(2));
        arena.reserve(1).expect("reserve");
        arena.push(leaf());

        let err = arena.reserve(2).expect_err("over budget");
        assert!(matches!(
            err,
            BTreeError::AllocationFailure(AllocationFailure::NodeBudget {
                requested: 2,
                available: 1
            })
        ));
        assert_eq!(arena.len(), 1);

        arena.reserve(1).expect("last slot");
    }
}
