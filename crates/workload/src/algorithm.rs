//! The routing schemes a simulation can compare.

use crate::error::{Result, WorkloadError};
use crate::simulation::SimulationConfig;
use corelib::{
    ConsistentHashRing, HotKeyRouter, KeyRouter, NodeId, RendezvousSelector,
    WeightedConsistentHashRing,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "ch")]
    ConsistentHashing,
    #[serde(rename = "wch")]
    WeightedCh,
    #[serde(rename = "hrw")]
    Rendezvous,
    #[serde(rename = "dhash")]
    DHash,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::ConsistentHashing,
        Algorithm::WeightedCh,
        Algorithm::Rendezvous,
        Algorithm::DHash,
    ];

    pub fn alias(&self) -> &'static str {
        match self {
            Algorithm::ConsistentHashing => "ch",
            Algorithm::WeightedCh => "wch",
            Algorithm::Rendezvous => "hrw",
            Algorithm::DHash => "dhash",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::ConsistentHashing => "Consistent Hashing",
            Algorithm::WeightedCh => "Weighted CH",
            Algorithm::Rendezvous => "Rendezvous",
            Algorithm::DHash => "D-HASH",
        }
    }

    /// Parse a comma-separated alias list such as `"ch,dhash"`.
    pub fn parse_list(list: &str) -> Result<Vec<Algorithm>> {
        let algorithms = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Algorithm>)
            .collect::<Result<Vec<_>>>()?;
        if algorithms.is_empty() {
            return Err(WorkloadError::invalid("algorithm list is empty"));
        }
        Ok(algorithms)
    }

    /// Weighted CH gives node `i` weight `1.0 + 0.1 * i`.
    pub fn weights(nodes: &[NodeId]) -> BTreeMap<NodeId, f64> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.clone(), 1.0 + 0.1 * i as f64))
            .collect()
    }

    /// Instantiate the scheme over `nodes`.
    pub fn build(&self, nodes: &[NodeId], config: &SimulationConfig) -> Result<Box<dyn KeyRouter>> {
        let config = &config.router;
        let nodes = nodes.iter().cloned();
        Ok(match self {
            Algorithm::ConsistentHashing => {
                Box::new(ConsistentHashRing::new(nodes, config.replicas)?)
            }
            Algorithm::WeightedCh => {
                let nodes: Vec<NodeId> = nodes.collect();
                let weights = Self::weights(&nodes);
                Box::new(WeightedConsistentHashRing::new(
                    nodes,
                    Some(&weights),
                    config.replicas,
                )?)
            }
            Algorithm::Rendezvous => Box::new(RendezvousSelector::new(nodes)),
            Algorithm::DHash => Box::new(HotKeyRouter::new(nodes, config.clone())?),
        })
    }
}

impl FromStr for Algorithm {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.alias().eq_ignore_ascii_case(s))
            .ok_or_else(|| WorkloadError::UnknownAlgorithm(s.to_owned()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{node_ids, Op};

    #[test]
    fn test_parse_aliases() {
        assert_eq!("DHASH".parse::<Algorithm>().unwrap(), Algorithm::DHash);
        assert_eq!(
            Algorithm::parse_list("ch, hrw,").unwrap(),
            [Algorithm::ConsistentHashing, Algorithm::Rendezvous]
        );
        assert!(matches!(
            Algorithm::parse_list("ch,maglev"),
            Err(WorkloadError::UnknownAlgorithm(a)) if a == "maglev"
        ));
        assert!(Algorithm::parse_list(" , ").is_err());
    }

    #[test]
    fn test_build_names_match() {
        let nodes = node_ids(["a", "b", "c"]);
        for algorithm in Algorithm::ALL {
            let mut router = algorithm.build(&nodes, &SimulationConfig::default()).unwrap();
            assert_eq!(router.name(), algorithm.display_name());
            assert!(nodes.contains(&router.route("k", Op::Read).unwrap()));
        }
    }

    #[test]
    fn test_weights_increase_by_index() {
        let nodes = node_ids(["a", "b", "c"]);
        let weights = Algorithm::weights(&nodes);
        assert_eq!(weights[&nodes[0]], 1.0);
        assert!((weights[&nodes[2]] - 1.2).abs() < 1e-12);
    }
}
