//! In-memory B-tree over integer keys.
//!
//! The tree owns a node arena and the minimum degree `t`. Every node holds at
//! most `2t - 1` keys; every node except the root holds at least `t - 1`.
//! Full nodes are split on the way down, before the insert descends into
//! them, so a parent always has room for the key promoted out of a child.
//!
//! Duplicate keys are accepted and stored as separate entries.

use super::arena::NodeArena;
use super::node::{Key, Node, NodeError, NodeId, NodeType};

/// The minimum degree `t` of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinDegree(usize);

impl MinDegree {
    /// Smallest usable degree. With `t = 1` leaves would hold no keys.
    pub const MIN: usize = 2;
    /// Largest accepted degree (nodes of ~128K keys).
    pub const MAX: usize = 1 << 16;

    /// Validate a minimum degree.
    pub const fn new(t: usize) -> Result<Self, BTreeError> {
        if t < Self::MIN {
            return Err(BTreeError::InvalidConfiguration {
                min_degree: t,
                reason: "minimum degree must be at least 2",
            });
        }
        if t > Self::MAX {
            return Err(BTreeError::InvalidConfiguration {
                min_degree: t,
                reason: "minimum degree exceeds 65536",
            });
        }
        Ok(Self(t))
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// `2t - 1`
    #[must_use]
    pub const fn max_keys(self) -> usize {
        2 * self.0 - 1
    }

    /// `t - 1`, the floor for every non-root node.
    #[must_use]
    pub const fn min_keys(self) -> usize {
        self.0 - 1
    }

    /// `2t`
    #[must_use]
    pub const fn max_children(self) -> usize {
        2 * self.0
    }

    /// Position of the key promoted out of a full node.
    const fn median_index(self) -> usize {
        self.0 - 1
    }
}

impl std::fmt::Display for MinDegree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a searched key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// The node holding the key.
    pub node: NodeId,
    /// Index of the key within that node.
    pub index: usize,
}

/// Outcome of [`BTree::insert_multiple`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsert {
    /// Number of keys inserted, in input order.
    pub inserted: usize,
    /// The first token that did not parse as a key. Nothing after it was read.
    pub halted_at: Option<String>,
}

impl BulkInsert {
    /// Whether every token in the input was inserted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// A B-tree of integer keys with minimum degree `t`.
#[derive(Debug)]
pub struct BTree {
    arena: NodeArena,
    root: Option<NodeId>,
    degree: MinDegree,
    /// Total number of keys stored, duplicates included.
    len: usize,
    /// Number of levels. 0 when empty, 1 for a lone leaf root.
    height: usize,
}

impl BTree {
    /// Create an empty tree with minimum degree `t`.
    ///
    /// Fails with `InvalidConfiguration` when `t < 2`.
    pub fn new(t: usize) -> Result<Self, BTreeError> {
        Self::build(t, None)
    }

    /// Create an empty tree that will never allocate more than `max_nodes`
    /// nodes. An insert that would need more fails with `AllocationFailure`.
    pub fn with_node_limit(t: usize, max_nodes: usize) -> Result<Self, BTreeError> {
        Self::build(t, Some(max_nodes))
    }

    fn build(t: usize, node_limit: Option<usize>) -> Result<Self, BTreeError> {
        let degree = MinDegree::new(t)?;
        tracing::debug!(min_degree = t, ?node_limit, "created b-tree");
        Ok(Self {
            arena: NodeArena::new(node_limit),
            root: None,
            degree,
            len: 0,
            height: 0,
        })
    }

    #[must_use]
    pub const fn min_degree(&self) -> MinDegree {
        self.degree
    }

    /// Number of keys stored, duplicates included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of levels from the root to the leaves.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of nodes allocated.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub const fn node_limit(&self) -> Option<usize> {
        self.arena.limit()
    }

    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Find `key`, returning the node and position that hold it.
    #[must_use]
    pub fn search(&self, key: Key) -> Option<SearchHit> {
        let hit = self.search_from(self.root?, key);
        tracing::trace!(key, found = hit.is_some(), "search");
        hit
    }

    /// Whether `key` is stored in the tree.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    fn search_from(&self, id: NodeId, key: Key) -> Option<SearchHit> {
        let node = self.arena.node(id);
        let index = node.search_position(key);

        if node.keys().get(index) == Some(&key) {
            return Some(SearchHit { node: id, index });
        }
        if node.is_leaf() {
            return None;
        }
        self.search_from(node.children()[index], key)
    }

    /// All keys in ascending order. Empty for an empty tree.
    #[must_use]
    pub fn traverse(&self) -> Vec<Key> {
        let mut keys = Vec::with_capacity(self.len);
        self.for_each_in_order(|key| keys.push(key));
        keys
    }

    /// Call `visit` on every key in ascending order.
    pub fn for_each_in_order<F: FnMut(Key)>(&self, mut visit: F) {
        if let Some(root) = self.root {
            self.walk_in_order(root, &mut visit);
        }
    }

    fn walk_in_order<F: FnMut(Key)>(&self, id: NodeId, visit: &mut F) {
        let node = self.arena.node(id);
        for (i, &key) in node.keys().iter().enumerate() {
            if !node.is_leaf() {
                self.walk_in_order(node.children()[i], visit);
            }
            visit(key);
        }
        if let Some(&last) = node.children().last() {
            self.walk_in_order(last, visit);
        }
    }

    /// Insert `key`. Duplicates are stored as separate entries.
    ///
    /// Every node this insert creates is allocated before the tree is
    /// touched, so on `AllocationFailure` the tree is left exactly as it was.
    pub fn insert(&mut self, key: Key) -> Result<(), BTreeError> {
        let Some(root) = self.root else {
            let mut leaf = Node::new(NodeType::Leaf, self.degree)?;
            leaf.insert_key_sorted(key)?;
            self.arena.reserve(1)?;
            self.root = Some(self.arena.push(leaf));
            self.height = 1;
            self.len = 1;
            tracing::trace!(key, "inserted into new root leaf");
            return Ok(());
        };

        let mut spares = self.allocate_split_siblings(root, key)?;

        if self.arena.node(root).is_full() {
            let mut new_root = Node::new(NodeType::Internal, self.degree)?;
            self.arena.reserve(spares.len() + 1)?;

            new_root.children.push(root)?;
            let new_root_id = self.arena.push(new_root);
            let sibling = spares
                .pop()
                .ok_or(BTreeError::Internal("root split was not planned"))?;
            self.split_child(new_root_id, 0, sibling)?;
            self.root = Some(new_root_id);
            self.height += 1;
            tracing::debug!(height = self.height, nodes = self.arena.len(), "root split");

            let new_root = self.arena.node(new_root_id);
            let target = new_root.children()[usize::from(new_root.keys()[0] < key)];
            self.insert_non_full(target, key, &mut spares)?;
        } else {
            self.arena.reserve(spares.len())?;
            self.insert_non_full(root, key, &mut spares)?;
        }

        debug_assert!(spares.is_empty(), "planned splits left unused");
        self.len += 1;
        tracing::trace!(key, len = self.len, "inserted");
        Ok(())
    }

    /// Allocate one empty sibling for every node the insert of `key` will
    /// split, in the order the splits happen (last element first).
    ///
    /// The walk follows the path the insert will take: a full node is split
    /// before it is entered, and a key equal to the promoted median stays in
    /// the left half.
    fn allocate_split_siblings(&self, root: NodeId, key: Key) -> Result<Vec<Node>, BTreeError> {
        let mut siblings = Vec::new();
        siblings
            .try_reserve_exact(self.height)
            .map_err(|_| BTreeError::AllocationFailure(AllocationFailure::OutOfMemory))?;

        let median = self.degree.median_index();
        let mut current = root;
        loop {
            let node = self.arena.node(current);
            let full = node.is_full();
            if full {
                siblings.push(Node::new(node.node_type(), self.degree)?);
            }
            if node.is_leaf() {
                break;
            }

            let mut index = node.find_child_index(key);
            if full && key <= node.keys()[median] {
                index = index.min(median);
            }
            current = node.children()[index];
        }

        siblings.reverse();
        Ok(siblings)
    }

    /// Insert into the subtree at `id`, which must not be full.
    fn insert_non_full(
        &mut self,
        id: NodeId,
        key: Key,
        spares: &mut Vec<Node>,
    ) -> Result<(), BTreeError> {
        let node = self.arena.node(id);
        debug_assert!(!node.is_full(), "insert_non_full on a full node");

        if node.is_leaf() {
            self.arena.node_mut(id).insert_key_sorted(key)?;
            return Ok(());
        }

        let mut index = node.find_child_index(key);
        if self.arena.node(node.children()[index]).is_full() {
            let sibling = spares
                .pop()
                .ok_or(BTreeError::Internal("child split was not planned"))?;
            self.split_child(id, index, sibling)?;
            if self.arena.node(id).keys()[index] < key {
                index += 1;
            }
        }

        let child = self.arena.node(id).children()[index];
        self.insert_non_full(child, key, spares)
    }

    /// Split the full child at `index` of `parent`, moving its upper half
    /// into `sibling` and promoting its median into `parent`.
    ///
    /// The sibling is filled and placed in the arena before the parent is
    /// modified; the parent's room is checked before anything moves.
    fn split_child(
        &mut self,
        parent: NodeId,
        index: usize,
        mut sibling: Node,
    ) -> Result<(), BTreeError> {
        let t = self.degree.get();
        let parent_node = self.arena.node(parent);
        if parent_node.is_full() {
            return Err(NodeError::Full {
                capacity: self.degree.max_keys(),
            }
            .into());
        }

        let child_id = parent_node.children()[index];
        let child = self.arena.node_mut(child_id);
        debug_assert!(child.is_full(), "split_child on a child that is not full");
        debug_assert_eq!(child.node_type(), sibling.node_type());

        let median = child.keys()[t - 1];
        child.keys.move_tail_into(t, &mut sibling.keys)?;
        child.keys.truncate(t - 1);
        if !child.is_leaf() {
            child.children.move_tail_into(t, &mut sibling.children)?;
        }

        let sibling_id = self.arena.push(sibling);

        let parent_node = self.arena.node_mut(parent);
        parent_node.keys.insert(index, median)?;
        parent_node.children.insert(index + 1, sibling_id)?;

        tracing::debug!(
            parent = %parent,
            child = %child_id,
            sibling = %sibling_id,
            median,
            "split child"
        );
        Ok(())
    }

    /// Insert every whitespace-separated integer in `text`, left to right.
    ///
    /// Consumption stops at the first token that is not an integer; that
    /// token and everything after it are discarded. The returned report says
    /// how many keys went in and which token stopped the scan.
    pub fn insert_multiple(&mut self, text: &str) -> Result<BulkInsert, BTreeError> {
        let mut report = BulkInsert::default();

        for token in text.split_whitespace() {
            let Ok(key) = token.parse::<Key>() else {
                tracing::warn!(
                    token,
                    inserted = report.inserted,
                    "bulk insert stopped at a token that is not an integer"
                );
                report.halted_at = Some(token.to_owned());
                break;
            };
            self.insert(key)?;
            report.inserted += 1;
        }

        Ok(report)
    }
}

/// Why an insert could not get the nodes it needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationFailure {
    /// The tree's node budget cannot cover the insert.
    NodeBudget { requested: usize, available: usize },
    /// The allocator refused a reservation.
    OutOfMemory,
}

/// Errors that can occur during B-tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BTreeError {
    /// The tree was configured with an unusable minimum degree.
    InvalidConfiguration {
        min_degree: usize,
        reason: &'static str,
    },
    /// Node allocation failed. The tree is unchanged.
    AllocationFailure(AllocationFailure),
    /// Node error.
    Node(NodeError),
    /// The tree reached a state its own bookkeeping rules out.
    Internal(&'static str),
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration { min_degree, reason } => {
                write!(f, "invalid configuration (t = {min_degree}): {reason}")
            }
            Self::AllocationFailure(AllocationFailure::NodeBudget {
                requested,
                available,
            }) => write!(
                f,
                "allocation failure: insert needs {requested} new nodes, budget has {available}"
            ),
            Self::AllocationFailure(AllocationFailure::OutOfMemory) => {
                write!(f, "allocation failure: out of memory")
            }
            Self::Node(e) => write!(f, "node error: {e}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for BTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Node(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NodeError> for BTreeError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::AllocationFailed { .. } => {
                Self::AllocationFailure(AllocationFailure::OutOfMemory)
            }
            NodeError::Full { .. } => Self::Node(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(t: usize, keys: &[Key]) -> BTree {
        let mut tree = BTree::new(t).expect("create tree");
        for &key in keys {
            tree.insert(key).expect("insert");
        }
        tree
    }

    /// Keys of every node, breadth first. Two trees with the same shape
    /// produce the same snapshot.
    fn shape(tree: &BTree) -> Vec<Vec<Key>> {
        let mut levels = Vec::new();
        let mut queue: std::collections::VecDeque<NodeId> = tree.root().into_iter().collect();
        while let Some(id) = queue.pop_front() {
            let node = tree.node(id).expect("node");
            levels.push(node.keys().to_vec());
            queue.extend(node.children().iter().copied());
        }
        levels
    }

    #[test]
    fn test_rejects_degree_below_two() {
        for t in [0, 1] {
            let err = BTree::new(t).expect_err("t < 2");
            assert!(matches!(
                err,
                BTreeError::InvalidConfiguration { min_degree, .. } if min_degree == t
            ));
        }
        assert!(BTree::new(2).is_ok());
    }

    #[test]
    fn test_rejects_degree_above_max() {
        assert!(matches!(
            BTree::new(MinDegree::MAX + 1),
            Err(BTreeError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_min_degree_bounds() {
        let degree = MinDegree::new(3).expect("degree");
        assert_eq!(degree.max_keys(), 5);
        assert_eq!(degree.min_keys(), 2);
        assert_eq!(degree.max_children(), 6);
    }

    #[test]
    fn test_empty_tree() {
        let tree = BTree::new(3).expect("create tree");
        assert!(tree.is_empty());
        assert_eq!(tree.search(1), None);
        assert!(!tree.contains(1));
        assert!(tree.traverse().is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.node_limit(), None);
    }

    #[test]
    fn test_reference_sequence() {
        let tree = tree_with(3, &[10, 20, 5, 6, 12, 30, 7, 17]);
        assert_eq!(tree.traverse(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
        assert!(tree.contains(12));
        assert!(!tree.contains(99));
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.height(), 2);
        assert_eq!(shape(&tree), vec![vec![10], vec![5, 6, 7], vec![12, 17, 20, 30]]);
    }

    #[test]
    fn test_first_split_on_sixth_key() {
        let tree = tree_with(3, &[1, 2, 3, 4, 5]);
        assert_eq!(tree.height(), 1);
        assert_eq!(shape(&tree), vec![vec![1, 2, 3, 4, 5]]);

        let tree = tree_with(3, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(tree.height(), 2);
        assert_eq!(shape(&tree), vec![vec![3], vec![1, 2], vec![4, 5, 6]]);
        assert_eq!(tree.traverse(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_search_reports_owning_node() {
        let tree = tree_with(3, &[1, 2, 3, 4, 5, 6]);
        let root = tree.root().expect("root");

        let hit = tree.search(3).expect("median is in the root");
        assert_eq!(hit, SearchHit { node: root, index: 0 });

        let hit = tree.search(5).expect("found in right leaf");
        let leaf = tree.node(hit.node).expect("node");
        assert!(leaf.is_leaf());
        assert_eq!(leaf.keys()[hit.index], 5);
        assert_eq!(tree.search(0), None);
        assert_eq!(tree.search(7), None);
    }

    #[test]
    fn test_duplicates_are_stored() {
        let tree = tree_with(2, &[5, 5, 5, 5, 5, 5, 5, 1, 9]);
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.traverse(), vec![1, 5, 5, 5, 5, 5, 5, 5, 9]);
        assert!(tree.contains(5));
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_traverse_is_repeatable() {
        let tree = tree_with(2, &[8, 3, 11, 1, 4, 9, 15, 2]);
        let first = tree.traverse();
        let second = tree.traverse();
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 2, 3, 4, 8, 9, 11, 15]);
    }

    #[test]
    fn test_height_grows_only_when_root_was_full() {
        let mut tree = BTree::new(2).expect("create tree");
        for key in 0..200 {
            let root_was_full = tree
                .root()
                .and_then(|id| tree.node(id))
                .is_some_and(Node::is_full);
            let before = tree.height();
            tree.insert(key).expect("insert");
            let expected = if root_was_full || before == 0 {
                before + 1
            } else {
                before
            };
            assert_eq!(tree.height(), expected, "after inserting {key}");
        }
    }

    #[test]
    fn test_height_is_logarithmic() {
        let tree = tree_with(2, &(1..=100).collect::<Vec<_>>());
        assert_eq!(tree.len(), 100);
        // (n + 1) / 2 = 50.5, so at most 1 + floor(log2(50.5)) = 6 levels;
        // with at most 3 keys per node at least 4 are needed.
        assert!((4..=6).contains(&tree.height()), "height {}", tree.height());
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_insert_multiple_stops_at_bad_token() {
        let mut tree = BTree::new(3).expect("create tree");
        let report = tree.insert_multiple("3 1 2 x 9").expect("bulk insert");
        assert_eq!(report.inserted, 3);
        assert_eq!(report.halted_at.as_deref(), Some("x"));
        assert!(!report.is_complete());
        assert_eq!(tree.traverse(), vec![1, 2, 3]);
        assert!(!tree.contains(9));
    }

    #[test]
    fn test_insert_multiple_rejects_partial_token() {
        let mut tree = BTree::new(3).expect("create tree");
        let report = tree.insert_multiple("12abc 4").expect("bulk insert");
        assert_eq!(report.inserted, 0);
        assert_eq!(report.halted_at.as_deref(), Some("12abc"));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_multiple_accepts_any_whitespace() {
        let mut tree = BTree::new(3).expect("create tree");
        let report = tree
            .insert_multiple("  7\t-2\n+4   7 ")
            .expect("bulk insert");
        assert!(report.is_complete());
        assert_eq!(report.inserted, 4);
        assert_eq!(tree.traverse(), vec![-2, 4, 7, 7]);

        let report = tree.insert_multiple("").expect("empty input");
        assert_eq!(report, BulkInsert::default());
    }

    #[test]
    fn test_allocation_failure_on_root_growth_leaves_tree_unchanged() {
        let mut tree = BTree::with_node_limit(2, 1).expect("create tree");
        for key in [1, 2, 3] {
            tree.insert(key).expect("fits in the root leaf");
        }

        assert_eq!(tree.node_limit(), Some(1));
        let err = tree.insert(4).expect_err("root split needs two more nodes");
        assert_eq!(
            err,
            BTreeError::AllocationFailure(AllocationFailure::NodeBudget {
                requested: 2,
                available: 0
            })
        );
        assert_eq!(tree.traverse(), vec![1, 2, 3]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_allocation_failure_mid_descent_leaves_tree_unchanged() {
        // t = 2: this builds a full root [2, 4, 6] whose left leaf
        // [-1, 0, 1] is also full. Inserting -2 needs a new root plus one
        // sibling each for the root and that leaf.
        let mut tree = BTree::with_node_limit(2, 6).expect("create tree");
        for key in [1, 2, 3, 4, 5, 6, 7, 0, -1, 8] {
            tree.insert(key).expect("insert");
        }
        let before = shape(&tree);
        assert_eq!(
            before,
            vec![vec![2, 4, 6], vec![-1, 0, 1], vec![3], vec![5], vec![7, 8]]
        );
        assert_eq!(tree.node_count(), 5);

        let err = tree.insert(-2).expect_err("needs three nodes");
        assert_eq!(
            err,
            BTreeError::AllocationFailure(AllocationFailure::NodeBudget {
                requested: 3,
                available: 1
            })
        );
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.node_count(), 5);
        assert!(tree.check_invariants().is_empty());
        assert!(!tree.contains(-2));
    }

    #[test]
    fn test_same_inserts_succeed_without_budget() {
        let mut tree = tree_with(2, &[1, 2, 3, 4, 5, 6, 7, 0, -1, 8]);
        tree.insert(-2).expect("unbounded");
        assert_eq!(tree.node_count(), 8);
        assert_eq!(tree.height(), 3);
        assert!(tree.check_invariants().is_empty());
        assert_eq!(tree.traverse(), (-2..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_moves_children_with_keys() {
        let keys: Vec<Key> = (1..=30).collect();
        let tree = tree_with(2, &keys);
        assert!(tree.height() >= 3);
        assert!(tree.check_invariants().is_empty());
        assert_eq!(tree.traverse(), keys);
        for key in keys {
            assert!(tree.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_error_display() {
        let err = BTree::new(1).expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "invalid configuration (t = 1): minimum degree must be at least 2"
        );
        let err = BTreeError::AllocationFailure(AllocationFailure::NodeBudget {
            requested: 2,
            available: 0,
        });
        assert_eq!(
            err.to_string(),
            "allocation failure: insert needs 2 new nodes, budget has 0"
        );
        let err = BTreeError::from(NodeError::Full { capacity: 5 });
        assert_eq!(err.to_string(), "node error: node container full (capacity 5)");
    }
}
