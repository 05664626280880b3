//! Consistent hash rings.
//!
//! A ring is a slice of virtual nodes sorted by token. A key resolves to the
//! first virtual node clockwise from its own token. Two variants exist: the
//! uniform ring gives every node the same number of replicas, the weighted ring
//! sizes each node's share by capacity.

pub mod consistent;
pub mod topology;
pub mod weighted;

pub use consistent::{ConsistentHashRing, RingBuilder};
pub use topology::RingTopology;
pub use weighted::WeightedConsistentHashRing;

use crate::vnode::VirtualNode;

/// Sort vnodes into ring order, keeping one entry per token.
pub(crate) fn normalize(vnodes: &mut Vec<VirtualNode>) {
    vnodes.sort_unstable();
    vnodes.dedup_by_key(|vnode| vnode.token);
}
