//! Hot-key router shared between threads.
//!
//! Per-key state lives in a [`DashMap`]. A read takes the write lock of the
//! key's shard, bumps the count and, on promotion, resolves the alternate
//! before releasing it. No increment is lost and each key is promoted once.

use super::phase::Schedule;
use super::state::{KeyState, Route};
use super::{KeyRouter, Op};
use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::ring::{ConsistentHashRing, RingTopology};
use dashmap::DashMap;
use std::sync::Arc;

struct Inner<R> {
    nodes: Vec<NodeId>,
    schedule: Schedule,
    ring: R,
    states: DashMap<String, KeyState>,
}

/// D-HASH router routed through `&self`.
///
/// Cloning is cheap and every clone sees the same counts. Key state is never
/// evicted, so `max_tracked_keys` must be unset.
pub struct SharedHotKeyRouter<R = ConsistentHashRing> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for SharedHotKeyRouter<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedHotKeyRouter<ConsistentHashRing> {
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

impl<R: RingTopology> SharedHotKeyRouter<R> {
    pub fn with_ring<I>(nodes: I, ring: R, config: RouterConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().map(Into::into).collect();
        if nodes.is_empty() {
            return Err(Error::config("router requires at least one node"));
        }
        if config.max_tracked_keys.is_some() {
            return Err(Error::config(
                "max_tracked_keys is not supported by the shared router",
            ));
        }
        let schedule = config.schedule()?;
        Ok(Self {
            inner: Arc::new(Inner {
                nodes,
                schedule,
                ring,
                states: DashMap::new(),
            }),
        })
    }

    pub fn get_node(&self, key: &str, op: Op) -> Result<NodeId> {
        let inner = &*self.inner;
        if op == Op::Write {
            return inner.ring.get_node(key);
        }

        let primary = inner.ring.get_node(key)?;
        let node_count = inner.nodes.len();
        let route = match inner.states.get_mut(key) {
            Some(mut state) => state.advance(key, &inner.schedule, &inner.ring, node_count)?,
            None => inner
                .states
                .entry(key.to_owned())
                .or_default()
                .advance(key, &inner.schedule, &inner.ring, node_count)?,
        };

        Ok(match route {
            Route::Alternate(node) => node,
            Route::Primary => primary,
        })
    }

    pub fn primary(&self, key: &str) -> Result<NodeId> {
        self.inner.ring.get_node(key)
    }

    pub fn read_count(&self, key: &str) -> u64 {
        self.inner.states.get(key).map_or(0, |state| state.reads)
    }

    pub fn alternate(&self, key: &str) -> Option<NodeId> {
        self.inner
            .states
            .get(key)
            .and_then(|state| state.alternate.clone())
    }

    pub fn tracked_keys(&self) -> usize {
        self.inner.states.len()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.inner.nodes
    }

    pub fn schedule(&self) -> &Schedule {
        &self.inner.schedule
    }
}

impl<R: RingTopology> KeyRouter for SharedHotKeyRouter<R> {
    fn route(&mut self, key: &str, op: Op) -> Result<NodeId> {
        self.get_node(key, op)
    }

    fn name(&self) -> &'static str {
        "D-HASH (shared)"
    }
}

impl<R> std::fmt::Debug for SharedHotKeyRouter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedHotKeyRouter")
            .field("nodes", &self.inner.nodes)
            .field("schedule", &self.inner.schedule)
            .field("tracked_keys", &self.inner.states.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::thread;

    #[test]
    fn test_matches_single_owner_router() {
        let config = RouterConfig::new(10, 5).with_replicas(50);
        let shared = SharedHotKeyRouter::new(["n1", "n2", "n3"], config.clone()).unwrap();
        let mut owned = super::super::HotKeyRouter::new(["n1", "n2", "n3"], config).unwrap();
        for i in 0..200 {
            let key = if i % 3 == 0 { "hot" } else { "warm" };
            assert_eq!(
                shared.get_node(key, Op::Read).unwrap(),
                owned.get_node(key, Op::Read).unwrap()
            );
        }
    }

    #[test]
    fn test_concurrent_reads_lose_no_updates() {
        let router = SharedHotKeyRouter::new(["a", "b", "c"], RouterConfig::new(100, 10)).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let router = router.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        router.get_node("hot", Op::Read).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(router.read_count("hot"), 8_000);
        let alternate = router.alternate("hot").unwrap();
        assert_ne!(alternate, router.primary("hot").unwrap());
    }

    #[test]
    fn test_bounded_config_rejected() {
        let config = RouterConfig::default().with_max_tracked_keys(NonZeroUsize::new(8).unwrap());
        assert!(SharedHotKeyRouter::new(["a"], config).is_err());
    }

    #[test]
    fn test_writes_skip_state() {
        let router = SharedHotKeyRouter::new(["a", "b"], RouterConfig::new(1, 1)).unwrap();
        let p = router.get_node("k", Op::Write).unwrap();
        assert_eq!(p, router.primary("k").unwrap());
        assert_eq!(router.tracked_keys(), 0);
    }

    #[test]
    fn test_failed_reads_leave_state_untouched() {
        let ring = ConsistentHashRing::empty(10).unwrap();
        let router = SharedHotKeyRouter::with_ring(["n1"], ring, RouterConfig::new(5, 1)).unwrap();
        for _ in 0..3 {
            assert_eq!(router.get_node("k", Op::Read), Err(Error::EmptyRing));
        }
        assert_eq!(router.read_count("k"), 0);
        assert_eq!(router.tracked_keys(), 0);
    }
}
