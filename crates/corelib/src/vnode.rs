//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each physical node owns several positions on the ring instead of one. More
//! positions smooth the share of the key space each node receives, and a node
//! joining the ring takes a little from many neighbours rather than a lot from
//! one.
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v) per physical node, v = replicas
//! - **Lookup**: O(log n) binary search over all n vnodes
//!
//! The routing benchmarks run with 100 replicas per node, which is what the
//! router defaults to.

use crate::node::NodeId;
use crate::token::Token;

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node.
///
/// # Invariants
///
/// - Every `VirtualNode` belongs to exactly one physical node
/// - Ordering is by token first, so a sorted slice of vnodes is the ring
///
/// # Example
///
/// ```rust
/// use corelib::{NodeId, VirtualNode};
///
/// let vnode = VirtualNode::from_index(&NodeId::from("redis-1"), 0);
/// assert_eq!(vnode.node_id(), &NodeId::from("redis-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    ///
    /// The hash of `"{node}:{index}"`.
    pub token: Token,

    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Create virtual node number `vnode_index` of `node_id`.
    ///
    /// The token is `hash64("{node_id}:{vnode_index}")`, so the same node and
    /// index always land on the same position.
    pub fn from_index(node_id: &NodeId, vnode_index: usize) -> Self {
        let vnode_key = format!("{}:{}", node_id, vnode_index);
        Self::new(Token::of(vnode_key), node_id.clone())
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        self.token.distance_to(&other.token)
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node_id)
    }
}
