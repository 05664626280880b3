//! Capacity-aware consistent hash ring.
//!
//! The ring holds `num_nodes * base_replicas` slots in total. Each node's
//! quota is its share of the total weight times that slot count. Every node
//! first receives the floor of its quota, then the leftover slots go one at a
//! time to the largest fractional remainders, ties broken by node id
//! ascending. A node that ends up with zero slots is never selected.

use super::{normalize, RingTopology};
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::router::{KeyRouter, Op};
use crate::vnode::VirtualNode;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WeightedConsistentHashRing {
    base_replicas: usize,
    weights: BTreeMap<NodeId, f64>,
    slots: BTreeMap<NodeId, usize>,
    vnodes: Vec<VirtualNode>,
}

impl WeightedConsistentHashRing {
    /// Build a weighted ring.
    ///
    /// `weights` defaults every node to 1.0; nodes missing from the map also
    /// get 1.0. Weights must be finite and non-negative with a positive sum,
    /// and may only name nodes present in `nodes`.
    pub fn new<I>(
        nodes: I,
        weights: Option<&BTreeMap<NodeId, f64>>,
        base_replicas: usize,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        if base_replicas == 0 {
            return Err(Error::config("base_replicas must be at least 1"));
        }

        let mut resolved = BTreeMap::new();
        for node in nodes {
            let node = node.into();
            let weight = weights.and_then(|w| w.get(&node)).copied().unwrap_or(1.0);
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::config(format!(
                    "weight for node {node} must be finite and non-negative, got {weight}"
                )));
            }
            resolved.insert(node, weight);
        }
        if let Some(weights) = weights {
            if let Some(unknown) = weights.keys().find(|n| !resolved.contains_key(*n)) {
                return Err(Error::config(format!("weight given for unknown node {unknown}")));
            }
        }

        let slots = allocate_slots(&resolved, base_replicas)?;
        let mut vnodes = Vec::with_capacity(slots.values().sum());
        for (node, &count) in &slots {
            for i in 0..count {
                vnodes.push(VirtualNode::from_index(node, i));
            }
        }
        normalize(&mut vnodes);
        debug!(
            nodes = resolved.len(),
            tokens = vnodes.len(),
            base_replicas,
            "built weighted consistent hash ring"
        );

        Ok(Self {
            base_replicas,
            weights: resolved,
            slots,
            vnodes,
        })
    }

    /// Virtual slots allocated to each node, zero-slot nodes included.
    pub fn slot_counts(&self) -> &BTreeMap<NodeId, usize> {
        &self.slots
    }

    pub fn weights(&self) -> &BTreeMap<NodeId, f64> {
        &self.weights
    }

    pub fn base_replicas(&self) -> usize {
        self.base_replicas
    }

    pub fn get_node(&self, key: &str) -> Result<NodeId> {
        RingTopology::get_node(self, key)
    }

    pub fn token_count(&self) -> usize {
        self.vnodes.len()
    }
}

/// Largest-remainder allocation of `weights.len() * base_replicas` slots.
pub fn allocate_slots(
    weights: &BTreeMap<NodeId, f64>,
    base_replicas: usize,
) -> Result<BTreeMap<NodeId, usize>> {
    if weights.is_empty() {
        return Ok(BTreeMap::new());
    }
    let total_slots = weights.len() * base_replicas;
    let weight_sum: f64 = weights.values().sum();
    if weight_sum <= 0.0 {
        return Err(Error::config("total node weight must be positive"));
    }

    let mut alloc = BTreeMap::new();
    let mut remainders = Vec::with_capacity(weights.len());
    for (node, &weight) in weights {
        let quota = weight / weight_sum * total_slots as f64;
        let floor = quota.floor();
        alloc.insert(node.clone(), floor as usize);
        remainders.push((node, quota - floor));
    }

    let assigned: usize = alloc.values().sum();
    let remain = total_slots.saturating_sub(assigned);
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (node, _) in remainders.into_iter().take(remain) {
        if let Some(count) = alloc.get_mut(node) {
            *count += 1;
        }
    }
    Ok(alloc)
}

impl RingTopology for WeightedConsistentHashRing {
    fn vnodes(&self) -> &[VirtualNode] {
        &self.vnodes
    }
}

impl KeyRouter for WeightedConsistentHashRing {
    fn route(&mut self, key: &str, _op: Op) -> Result<NodeId> {
        RingTopology::get_node(self, key)
    }

    fn name(&self) -> &'static str {
        "Weighted CH"
    }
}
