//! The capability the hot-key router needs from a ring.

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// A ring that exposes its sorted virtual nodes.
///
/// Primary resolution and alternate selection are both expressed over
/// [`vnodes`](RingTopology::vnodes), so any implementation gets the same
/// clockwise lookup for free. Implementations must keep the slice sorted by
/// token.
pub trait RingTopology: Send + Sync {
    /// Virtual nodes in ascending token order.
    fn vnodes(&self) -> &[VirtualNode];

    /// Index of the vnode owning `key`: the first token `>=` the key's token,
    /// wrapping to the start of the ring.
    ///
    /// A key whose token equals a vnode's token belongs to that vnode, not to
    /// the next one. Strict `>` lookups only disagree on such exact collisions.
    fn locate(&self, key: &str) -> Result<usize> {
        let vnodes = self.vnodes();
        if vnodes.is_empty() {
            return Err(Error::EmptyRing);
        }
        let token = Token::of(key);
        let idx = vnodes.partition_point(|vnode| vnode.token < token);
        Ok(if idx == vnodes.len() { 0 } else { idx })
    }

    /// Primary node for `key`.
    fn get_node(&self, key: &str) -> Result<NodeId> {
        let idx = self.locate(key)?;
        Ok(self.vnodes()[idx].node_id.clone())
    }

    fn token_count(&self) -> usize {
        self.vnodes().len()
    }

    fn is_empty(&self) -> bool {
        self.vnodes().is_empty()
    }
}

impl<R: RingTopology + ?Sized> RingTopology for Box<R> {
    fn vnodes(&self) -> &[VirtualNode] {
        (**self).vnodes()
    }
}

impl<R: RingTopology + ?Sized> RingTopology for std::sync::Arc<R> {
    fn vnodes(&self) -> &[VirtualNode] {
        (**self).vnodes()
    }
}
