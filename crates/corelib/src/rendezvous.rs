//! Rendezvous (highest random weight) selection.
//!
//! Stateless alternative to the ring: every node is scored against the key
//! with `hash64("{key}|{node}")` and the highest score wins. Lookup is O(n) in
//! the node count; changing membership is just changing the list.

use crate::error::{Error, Result};
use crate::hash::hash64;
use crate::node::NodeId;
use crate::router::{KeyRouter, Op};

#[derive(Debug, Clone, Default)]
pub struct RendezvousSelector {
    nodes: Vec<NodeId>,
}

impl RendezvousSelector {
    pub fn new<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// Score of `node` for `key`.
    pub fn score(key: &str, node: &NodeId) -> u64 {
        let mut material = String::with_capacity(key.len() + 1 + node.as_str().len());
        material.push_str(key);
        material.push('|');
        material.push_str(node.as_str());
        hash64(material)
    }

    /// Node with the strictly greatest score; the first one wins a tie.
    pub fn get_node(&self, key: &str) -> Result<NodeId> {
        let mut best: Option<(&NodeId, u64)> = None;
        for node in &self.nodes {
            let score = Self::score(key, node);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((node, score)),
            }
        }
        best.map(|(node, _)| node.clone()).ok_or(Error::EmptyNodeList)
    }

    /// Returns false if the node was already present.
    pub fn add_node(&mut self, node: impl Into<NodeId>) -> bool {
        let node = node.into();
        if self.nodes.contains(&node) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn remove_node(&mut self, node: &NodeId) -> bool {
        match self.nodes.iter().position(|n| n == node) {
            Some(idx) => {
                self.nodes.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

impl KeyRouter for RendezvousSelector {
    fn route(&mut self, key: &str, _op: Op) -> Result<NodeId> {
        self.get_node(key)
    }

    fn name(&self) -> &'static str {
        "Rendezvous"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::node_ids;

    #[test]
    fn test_empty_returns_error() {
        let selector = RendezvousSelector::default();
        assert_eq!(selector.get_node("any-key"), Err(Error::EmptyNodeList));
    }

    #[test]
    fn test_picks_max_score() {
        let nodes = node_ids(["n1", "n2", "n3", "n4"]);
        let selector = RendezvousSelector::new(nodes.clone());
        for i in 0..50 {
            let key = format!("key-{i}");
            let best = nodes
                .iter()
                .max_by_key(|n| RendezvousSelector::score(&key, n))
                .unwrap();
            assert_eq!(&selector.get_node(&key).unwrap(), best);
        }
    }

    #[test]
    fn test_score_material_format() {
        let node = NodeId::from("n1");
        assert_eq!(RendezvousSelector::score("k", &node), hash64("k|n1"));
    }

    #[test]
    fn test_removal_only_moves_keys_of_removed_node() {
        let mut selector = RendezvousSelector::new(["a", "b", "c", "d"]);
        let before: Vec<NodeId> = (0..500)
            .map(|i| selector.get_node(&format!("k{i}")).unwrap())
            .collect();

        let removed = NodeId::from("c");
        assert!(selector.remove_node(&removed));
        assert!(!selector.remove_node(&removed));

        for (i, old) in before.iter().enumerate() {
            let now = selector.get_node(&format!("k{i}")).unwrap();
            if old != &removed {
                assert_eq!(&now, old);
            } else {
                assert_ne!(now, removed);
            }
        }
    }

    #[test]
    fn test_add_node_dedups() {
        let mut selector = RendezvousSelector::new(["a"]);
        assert!(selector.add_node("b"));
        assert!(!selector.add_node("a"));
        assert_eq!(selector.nodes().len(), 2);
    }
}
