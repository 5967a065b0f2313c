//! B-tree node types.
//!
//! A node holds up to `2t - 1` sorted keys and, when internal, up to `2t`
//! child handles. Both are stored in fixed-capacity containers sized when the
//! node is created, so a node never reallocates once it exists.

use super::tree::MinDegree;

/// A key stored in the tree.
pub type Key = i64;

/// Handle to a node in the tree's arena (0-indexed allocation order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

impl NodeId {
    /// The arena slot this handle refers to.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type discriminant. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

/// A container whose capacity is fixed when it is created.
///
/// The backing buffer is reserved up front, so `insert` and `push` never
/// allocate. Inserting into a full container is an error.
#[derive(Debug)]
pub(super) struct Bounded<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Bounded<T> {
    /// Reserve a buffer for exactly `capacity` items.
    pub(super) fn with_capacity(capacity: usize) -> Result<Self, NodeError> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| NodeError::AllocationFailed { capacity })?;
        Ok(Self { items, capacity })
    }

    pub(super) fn len(&self) -> usize {
        self.items.len()
    }

    pub(super) fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub(super) fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(super) fn push(&mut self, item: T) -> Result<(), NodeError> {
        self.insert(self.items.len(), item)
    }

    /// Insert `item` at `index`, shifting everything after it right by one.
    pub(super) fn insert(&mut self, index: usize, item: T) -> Result<(), NodeError> {
        if self.is_full() {
            return Err(NodeError::Full {
                capacity: self.capacity,
            });
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Drop everything from `len` onward.
    pub(super) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Move `self[at..]` onto the end of `dest`.
    ///
    /// Fails without moving anything if `dest` lacks room for all of them.
    pub(super) fn move_tail_into(&mut self, at: usize, dest: &mut Self) -> Result<(), NodeError> {
        let moving = self.items.len().saturating_sub(at);
        if dest.items.len() + moving > dest.capacity {
            return Err(NodeError::Full {
                capacity: dest.capacity,
            });
        }
        dest.items.extend(self.items.drain(at..));
        Ok(())
    }
}

/// A single B-tree node.
///
/// Internal nodes satisfy `children.len() == keys.len() + 1`; leaves carry no
/// children. `keys` is always sorted ascending (duplicates allowed).
#[derive(Debug)]
pub struct Node {
    node_type: NodeType,
    pub(super) keys: Bounded<Key>,
    pub(super) children: Bounded<NodeId>,
}

impl Node {
    /// Create an empty node with buffers sized for minimum degree `degree`.
    pub(super) fn new(node_type: NodeType, degree: MinDegree) -> Result<Self, NodeError> {
        let child_capacity = match node_type {
            NodeType::Internal => degree.max_children(),
            NodeType::Leaf => 0,
        };

        Ok(Self {
            node_type,
            keys: Bounded::with_capacity(degree.max_keys())?,
            children: Bounded::with_capacity(child_capacity)?,
        })
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.node_type
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node_type == NodeType::Leaf
    }

    /// Keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        self.keys.as_slice()
    }

    /// Child handles. Empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Whether the node holds `2t - 1` keys and must be split before it can
    /// take another.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.keys.is_full()
    }

    /// Index of the first key `>= key`.
    ///
    /// Search matches at this position or descends into the child here.
    #[must_use]
    pub fn search_position(&self, key: Key) -> usize {
        self.keys().partition_point(|k| *k < key)
    }

    /// Index of the child whose subtree receives `key` on insert.
    ///
    /// This is the first child to the right of every key `<= key`, so ties
    /// with existing keys go right.
    #[must_use]
    pub fn find_child_index(&self, key: Key) -> usize {
        self.keys().partition_point(|k| *k <= key)
    }

    /// Place `key` in a leaf, keeping the keys sorted.
    ///
    /// Equal keys already present stay in front of the new one.
    pub(super) fn insert_key_sorted(&mut self, key: Key) -> Result<usize, NodeError> {
        let position = self.find_child_index(key);
        self.keys.insert(position, key)?;
        Ok(position)
    }
}

/// Errors raised by node containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// A fixed-capacity container was asked to hold more than it can.
    Full { capacity: usize },
    /// A node buffer could not be reserved.
    AllocationFailed { capacity: usize },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full { capacity } => write!(f, "node container full (capacity {capacity})"),
            Self::AllocationFailed { capacity } => {
                write!(f, "failed to reserve node buffer of {capacity} slots")
            }
        }
    }
}

impl std::error::Error for NodeError {}
