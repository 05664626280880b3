//! Per-key router state.

use super::phase::{Phase, Schedule};
use super::resolve_alternate;
use crate::error::Result;
use crate::node::NodeId;
use crate::ring::RingTopology;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

/// Read count and alternate of one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Reads observed by this router. Never decremented.
    pub reads: u64,
    /// Set once on promotion and never changed afterwards.
    pub alternate: Option<NodeId>,
}

/// Outcome of a read once the key's state has been updated.
pub(crate) enum Route {
    Primary,
    Alternate(NodeId),
}

impl KeyState {
    /// Count one read of `key` and decide where it goes.
    pub(crate) fn advance<R>(
        &mut self,
        key: &str,
        schedule: &Schedule,
        ring: &R,
        node_count: usize,
    ) -> Result<Route>
    where
        R: RingTopology + ?Sized,
    {
        self.reads += 1;
        let phase = schedule.phase(self.reads, self.alternate.is_some());
        if phase == Phase::Cold {
            return Ok(Route::Primary);
        }

        if self.alternate.is_none() {
            let alternate = resolve_alternate(ring, key, node_count)?;
            debug!(key, reads = self.reads, %alternate, "promoted hot key");
            self.alternate = Some(alternate);
        }

        Ok(match (phase, &self.alternate) {
            (Phase::Alternate, Some(alternate)) => Route::Alternate(alternate.clone()),
            _ => Route::Primary,
        })
    }
}

/// Key state store, unbounded or LRU-capped.
pub(crate) enum KeyStates {
    Unbounded(HashMap<String, KeyState>),
    Bounded(LruCache<String, KeyState>),
}

impl KeyStates {
    pub(crate) fn new(capacity: Option<NonZeroUsize>) -> Self {
        match capacity {
            Some(cap) => KeyStates::Bounded(LruCache::new(cap)),
            None => KeyStates::Unbounded(HashMap::new()),
        }
    }

    /// Run `f` on the state of `key`, creating it if absent.
    pub(crate) fn update<T>(&mut self, key: &str, f: impl FnOnce(&mut KeyState) -> T) -> T {
        match self {
            KeyStates::Unbounded(map) => {
                if let Some(state) = map.get_mut(key) {
                    return f(state);
                }
                let mut state = KeyState::default();
                let out = f(&mut state);
                map.insert(key.to_owned(), state);
                out
            }
            KeyStates::Bounded(cache) => {
                if let Some(state) = cache.get_mut(key) {
                    return f(state);
                }
                let mut state = KeyState::default();
                let out = f(&mut state);
                if let Some((evicted, _)) = cache.push(key.to_owned(), state) {
                    trace!(key = %evicted, "evicted key state");
                }
                out
            }
        }
    }

    /// Look at a key without touching recency.
    pub(crate) fn get(&self, key: &str) -> Option<&KeyState> {
        match self {
            KeyStates::Unbounded(map) => map.get(key),
            KeyStates::Bounded(cache) => cache.peek(key),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            KeyStates::Unbounded(map) => map.len(),
            KeyStates::Bounded(cache) => cache.len(),
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            KeyStates::Unbounded(map) => map.clear(),
            KeyStates::Bounded(cache) => cache.clear(),
        }
    }
}

impl std::fmt::Debug for KeyStates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStates::Unbounded(map) => f.debug_tuple("Unbounded").field(&map.len()).finish(),
            KeyStates::Bounded(cache) => f
                .debug_struct("Bounded")
                .field("len", &cache.len())
                .field("cap", &cache.cap())
                .finish(),
        }
    }
}
