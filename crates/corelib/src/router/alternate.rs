//! Alternate node selection for promoted keys.
//!
//! Starting at the primary's ring index, walk the ring in steps of a
//! key-dependent stride `1 + hash64("{key}|alt") % (num_nodes - 1)` and take
//! the first node that differs from the primary. Different hot keys sharing a
//! primary therefore tend to land on different alternates. If the stride walk
//! finds nothing a unit-step walk is tried; failing both, the primary is its
//! own alternate.

use crate::error::Result;
use crate::hash::hash64;
use crate::node::NodeId;
use crate::ring::RingTopology;
use crate::vnode::VirtualNode;

/// Choose the alternate node for `key`.
///
/// `node_count` is the number of configured physical nodes. With fewer than two
/// the primary is returned.
pub fn resolve_alternate<R>(ring: &R, key: &str, node_count: usize) -> Result<NodeId>
where
    R: RingTopology + ?Sized,
{
    let start = ring.locate(key)?;
    let vnodes = ring.vnodes();
    let primary = &vnodes[start].node_id;
    if node_count < 2 {
        return Ok(primary.clone());
    }

    let span = (node_count - 1) as u64;
    let stride = 1 + (hash64(format!("{key}|alt")) % span) as usize;

    let alternate = walk(vnodes, primary, start, stride)
        .or_else(|| walk(vnodes, primary, start, 1))
        .unwrap_or(primary);
    Ok(alternate.clone())
}

fn walk<'a>(
    vnodes: &'a [VirtualNode],
    primary: &NodeId,
    start: usize,
    stride: usize,
) -> Option<&'a NodeId> {
    let len = vnodes.len();
    let mut idx = start;
    for _ in 0..len {
        idx = (idx + stride) % len;
        let candidate = &vnodes[idx].node_id;
        if candidate != primary {
            return Some(candidate);
        }
    }
    None
}
