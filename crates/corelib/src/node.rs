//! Node identifiers.
//!
//! A node is an opaque name for a physical shard or replica target. The router
//! hands these back to the caller, which performs the actual I/O.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier of a physical node.
///
/// Shared string so the ring, alternate map and callers can hold copies
/// without reallocating. Equality and ordering are by value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(name: impl AsRef<str>) -> Self {
        NodeId(Arc::from(name.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        NodeId::new(name)
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        NodeId(Arc::from(name))
    }
}

impl From<&String> for NodeId {
    fn from(name: &String) -> Self {
        NodeId::new(name)
    }
}

impl From<&NodeId> for NodeId {
    fn from(node: &NodeId) -> Self {
        node.clone()
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Collect anything name-like into node identifiers.
pub fn node_ids<I>(names: I) -> Vec<NodeId>
where
    I: IntoIterator,
    I::Item: Into<NodeId>,
{
    names.into_iter().map(Into::into).collect()
}
