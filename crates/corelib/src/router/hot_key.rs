//! Single-owner hot-key router.

use super::phase::Schedule;
use super::state::{KeyStates, Route};
use super::{KeyRouter, Op};
use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::ring::{ConsistentHashRing, RingTopology};
use tracing::warn;

/// D-HASH router.
///
/// Owns its counters and alternate map, so reads take `&mut self`. Hand one
/// router to each worker, or use [`SharedHotKeyRouter`](super::SharedHotKeyRouter)
/// when several threads must see the same counts.
///
/// The per-key state is client-local and approximate: two router instances
/// never share counts.
///
/// # Example
///
/// ```rust
/// use corelib::{HotKeyRouter, Op, RouterConfig};
///
/// let mut router = HotKeyRouter::new(["n1", "n2"], RouterConfig::new(10, 5)).unwrap();
/// let primary = router.get_node("hot-key", Op::Write).unwrap();
///
/// let reads: Vec<_> = (0..15)
///     .map(|_| router.get_node("hot-key", Op::Read).unwrap())
///     .collect();
/// assert!(reads[..14].iter().all(|n| n == &primary));
/// assert_ne!(reads[14], primary);
/// ```
#[derive(Debug)]
pub struct HotKeyRouter<R = ConsistentHashRing> {
    nodes: Vec<NodeId>,
    schedule: Schedule,
    ring: R,
    states: KeyStates,
}

impl HotKeyRouter<ConsistentHashRing> {
    /// Build a router over a fresh consistent hash ring of `nodes`.
    pub fn new<I>(nodes: I, config: RouterConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().map(Into::into).collect();
        config.validate()?;
        let ring = ConsistentHashRing::new(nodes.iter().cloned(), config.replicas)?;
        Self::with_ring(nodes, ring, config)
    }
}

impl<R: RingTopology> HotKeyRouter<R> {
    /// Build a router over an existing ring.
    ///
    /// `nodes` still drives the alternate stride, so it should name the same
    /// physical nodes as the ring. `config.replicas` is ignored.
    pub fn with_ring<I>(nodes: I, ring: R, config: RouterConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().map(Into::into).collect();
        if nodes.is_empty() {
            return Err(Error::config("router requires at least one node"));
        }
        let schedule = config.schedule()?;
        if nodes.len() == 1 {
            warn!(node = %nodes[0], "single-node router, hot keys stay on their primary");
        }
        Ok(Self {
            nodes,
            schedule,
            ring,
            states: KeyStates::new(config.max_tracked_keys),
        })
    }

    /// Route one request.
    ///
    /// Writes go to the primary and leave the counters alone. Reads bump the
    /// key's count and then follow the cold / guard / epoch schedule.
    pub fn get_node(&mut self, key: &str, op: Op) -> Result<NodeId> {
        if op == Op::Write {
            return self.primary(key);
        }

        // Resolve before touching state so a failed lookup counts nothing.
        let primary = self.ring.get_node(key)?;
        let node_count = self.nodes.len();
        let (schedule, ring) = (&self.schedule, &self.ring);
        let route = self
            .states
            .update(key, |state| state.advance(key, schedule, ring, node_count))?;

        Ok(match route {
            Route::Alternate(node) => node,
            Route::Primary => primary,
        })
    }

    /// Primary node of `key` on the underlying ring.
    #[inline]
    pub fn primary(&self, key: &str) -> Result<NodeId> {
        self.ring.get_node(key)
    }

    /// Reads observed for `key`, 0 if never read (or evicted).
    pub fn read_count(&self, key: &str) -> u64 {
        self.states.get(key).map_or(0, |state| state.reads)
    }

    /// Alternate of `key` if it has been promoted.
    pub fn alternate(&self, key: &str) -> Option<&NodeId> {
        self.states.get(key).and_then(|state| state.alternate.as_ref())
    }

    pub fn is_promoted(&self, key: &str) -> bool {
        self.alternate(key).is_some()
    }

    /// Number of keys with state.
    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }

    /// Forget all counts and alternates.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    pub fn threshold(&self) -> u64 {
        self.schedule.threshold()
    }

    pub fn window(&self) -> u64 {
        self.schedule.window()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn ring(&self) -> &R {
        &self.ring
    }
}

impl<R: RingTopology> KeyRouter for HotKeyRouter<R> {
    fn route(&mut self, key: &str, op: Op) -> Result<NodeId> {
        self.get_node(key, op)
    }

    fn name(&self) -> &'static str {
        "D-HASH"
    }
}
