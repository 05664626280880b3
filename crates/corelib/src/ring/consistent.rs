//! Uniform consistent hash ring.

use super::{normalize, RingTopology};
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::router::{KeyRouter, Op};
use crate::vnode::VirtualNode;
use tracing::debug;

/// Replicas per physical node used when none is configured.
pub const DEFAULT_REPLICAS: usize = 100;

/// Consistent hash ring where every node owns `replicas` positions.
///
/// Node `n` owns the tokens `hash64("n:0")` .. `hash64("n:{replicas-1}")`.
/// Lookup is a binary search for the first token at or after the key's token.
/// For a fixed node set and replica count the mapping is a pure function of
/// the key.
#[derive(Debug, Clone)]
pub struct ConsistentHashRing {
    replicas: usize,
    vnodes: Vec<VirtualNode>,
    /// Distinct physical nodes in insertion order.
    nodes: Vec<NodeId>,
}

impl ConsistentHashRing {
    /// Build a ring from `nodes`, each with `replicas` virtual nodes.
    ///
    /// An empty node list yields an empty ring; lookups on it fail with
    /// [`Error::EmptyRing`].
    pub fn new<I>(nodes: I, replicas: usize) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let mut ring = Self::empty(replicas)?;
        for node in nodes {
            ring.insert(node.into());
        }
        normalize(&mut ring.vnodes);
        debug!(
            nodes = ring.nodes.len(),
            tokens = ring.vnodes.len(),
            replicas,
            "built consistent hash ring"
        );
        Ok(ring)
    }

    /// A ring with no nodes yet.
    pub fn empty(replicas: usize) -> Result<Self> {
        if replicas == 0 {
            return Err(Error::config("replicas must be at least 1"));
        }
        Ok(Self {
            replicas,
            vnodes: Vec::new(),
            nodes: Vec::new(),
        })
    }

    /// Place `replicas` virtual nodes for `node` on the ring.
    ///
    /// Adding a node that is already present recomputes the same tokens, so the
    /// ring is unchanged.
    pub fn add_node(&mut self, node: impl Into<NodeId>) {
        self.insert(node.into());
        normalize(&mut self.vnodes);
    }

    fn insert(&mut self, node: NodeId) {
        self.vnodes.reserve(self.replicas);
        for i in 0..self.replicas {
            self.vnodes.push(VirtualNode::from_index(&node, i));
        }
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    /// Primary node for `key`.
    pub fn get_node(&self, key: &str) -> Result<NodeId> {
        RingTopology::get_node(self, key)
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.vnodes.len()
    }
}

impl RingTopology for ConsistentHashRing {
    fn vnodes(&self) -> &[VirtualNode] {
        &self.vnodes
    }
}

impl KeyRouter for ConsistentHashRing {
    fn route(&mut self, key: &str, _op: Op) -> Result<NodeId> {
        RingTopology::get_node(self, key)
    }

    fn name(&self) -> &'static str {
        "Consistent Hashing"
    }
}

/// Builder for a [`ConsistentHashRing`].
///
/// ```rust
/// use corelib::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_replicas(8)
///     .add_node("redis-1")
///     .add_node("redis-2")
///     .build()
///     .unwrap();
/// assert_eq!(ring.token_count(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuilder {
    replicas: usize,
    nodes: Vec<NodeId>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            nodes: Vec::new(),
        }
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn add_node(mut self, node: impl Into<NodeId>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn add_nodes<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<ConsistentHashRing> {
        ConsistentHashRing::new(self.nodes, self.replicas)
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
