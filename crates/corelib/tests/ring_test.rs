//! Tests for the ring variants and rendezvous selection.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: empty ring, add/lookup
//! 2. **Multiple nodes**: coverage, determinism, distribution
//! 3. **Weighted allocation**: proportional slots, drained nodes
//! 4. **Rendezvous**: same contract as the rings

use corelib::{
    node_ids, ConsistentHashRing, Error, NodeId, RendezvousSelector, RingBuilder, RingTopology,
    WeightedConsistentHashRing,
};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_empty_ring_lookup() {
    let ring = ConsistentHashRing::empty(4).unwrap();
    assert_eq!(ring.get_node("key1"), Err(Error::EmptyRing));
    assert_eq!(ring.node_count(), 0);
    assert_eq!(ring.token_count(), 0);
}

#[test]
fn test_add_node_and_lookup() {
    let mut ring = ConsistentHashRing::empty(4).unwrap();
    ring.add_node("node1");

    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.token_count(), 4);
    assert_eq!(ring.get_node("test-key").unwrap(), "node1");
}

#[test]
fn test_add_node_keeps_existing_keys_or_moves_them_to_new_node() {
    let mut ring = ConsistentHashRing::new(["node1", "node2"], 32).unwrap();
    let keys: Vec<String> = (0..1_000).map(|i| format!("key-{i}")).collect();
    let before: Vec<NodeId> = keys.iter().map(|k| ring.get_node(k).unwrap()).collect();

    ring.add_node("node3");
    for (key, old) in keys.iter().zip(&before) {
        let now = ring.get_node(key).unwrap();
        assert!(now == *old || now == "node3", "{key} moved {old} -> {now}");
    }
}

// ============================================================================
// Multiple Nodes Tests
// ============================================================================

#[test]
fn test_lookup_coverage() {
    let nodes = node_ids(["node1", "node2", "node3"]);
    let ring = ConsistentHashRing::new(nodes.clone(), 4).unwrap();
    assert_eq!(ring.token_count(), 12);

    for i in 0..500 {
        let node = ring.get_node(&format!("key{i}")).unwrap();
        assert!(nodes.contains(&node), "key{i} mapped outside the node set");
    }
}

#[test]
fn test_consistent_lookup_across_instances() {
    let a = ConsistentHashRing::new(["node1", "node2", "node3"], 100).unwrap();
    let b = ConsistentHashRing::new(["node1", "node2", "node3"], 100).unwrap();

    for i in 0..500 {
        let key = format!("consistent-key-{i}");
        let first = a.get_node(&key).unwrap();
        assert_eq!(first, a.get_node(&key).unwrap());
        assert_eq!(first, b.get_node(&key).unwrap());
    }
}

#[test]
fn test_distribution_is_roughly_even() {
    let ring = ConsistentHashRing::new(["a", "b", "c", "d", "e"], 100).unwrap();
    let mut counts: HashMap<NodeId, usize> = HashMap::new();
    let total = 50_000;
    for i in 0..total {
        *counts.entry(ring.get_node(&format!("k{i}")).unwrap()).or_default() += 1;
    }
    assert_eq!(counts.len(), 5);
    for (node, count) in counts {
        let share = count as f64 / total as f64;
        assert!((0.10..0.30).contains(&share), "{node} owns {share:.3}");
    }
}

// ============================================================================
// Ring Builder Tests
// ============================================================================

#[test]
fn test_ring_builder_custom_replicas() {
    let ring = RingBuilder::new()
        .with_replicas(8)
        .add_node("node1")
        .add_node("node2")
        .build()
        .unwrap();

    assert_eq!(ring.node_count(), 2);
    assert_eq!(ring.token_count(), 16);
    assert!(ring.get_node("key").is_ok());
}

#[test]
fn test_ring_builder_zero_replicas() {
    assert!(matches!(
        RingBuilder::new().with_replicas(0).add_node("n").build(),
        Err(Error::InvalidConfig(_))
    ));
}

// ============================================================================
// Weighted Ring Tests
// ============================================================================

#[test]
fn test_weighted_uniform_matches_plain_ring() {
    let plain = ConsistentHashRing::new(["a", "b", "c"], 50).unwrap();
    let weighted = WeightedConsistentHashRing::new(["a", "b", "c"], None, 50).unwrap();
    assert_eq!(plain.vnodes(), weighted.vnodes());
    for i in 0..200 {
        let key = format!("k{i}");
        assert_eq!(plain.get_node(&key).unwrap(), weighted.get_node(&key).unwrap());
    }
}

#[test]
fn test_weighted_slot_totals() {
    let nodes = node_ids(["redis-1", "redis-2", "redis-3", "redis-4", "redis-5"]);
    let weights: BTreeMap<NodeId, f64> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), 1.0 + 0.1 * i as f64))
        .collect();
    let ring = WeightedConsistentHashRing::new(nodes.clone(), Some(&weights), 100).unwrap();

    let slots = ring.slot_counts();
    assert_eq!(slots.values().sum::<usize>(), 500);
    let weight_sum: f64 = weights.values().sum();
    for node in &nodes {
        let quota = weights[node] / weight_sum * 500.0;
        let got = slots[node] as f64;
        assert!((got - quota).abs() <= 1.0, "{node}: {got} vs quota {quota}");
    }
    // heavier nodes never get fewer slots
    let counts: Vec<usize> = nodes.iter().map(|n| slots[n]).collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_weighted_heavier_node_owns_more_keys() {
    let weights: BTreeMap<NodeId, f64> =
        [("big", 3.0), ("small", 1.0)].into_iter().map(|(n, w)| (n.into(), w)).collect();
    let ring = WeightedConsistentHashRing::new(["big", "small"], Some(&weights), 100).unwrap();
    let big = (0..20_000)
        .filter(|i| ring.get_node(&format!("k{i}")).unwrap() == "big")
        .count();
    assert!(big > 12_000, "big owned only {big} of 20000");
}

// ============================================================================
// Rendezvous Tests
// ============================================================================

#[test]
fn test_rendezvous_coverage_and_determinism() {
    let nodes = node_ids(["n1", "n2", "n3"]);
    let a = RendezvousSelector::new(nodes.clone());
    let b = RendezvousSelector::new(nodes.clone());
    for i in 0..300 {
        let key = format!("k{i}");
        let node = a.get_node(&key).unwrap();
        assert!(nodes.contains(&node));
        assert_eq!(node, b.get_node(&key).unwrap());
    }
}

#[test]
fn test_rendezvous_empty() {
    let selector = RendezvousSelector::new(Vec::<NodeId>::new());
    assert_eq!(selector.get_node("k"), Err(Error::EmptyNodeList));
}
