//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// All of these are configuration or programming errors. The core performs no
/// I/O, so nothing here is transient and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Lookup on a ring that holds no virtual nodes.
    #[error("ring is empty, add nodes first")]
    EmptyRing,
    /// Lookup on a rendezvous selector with no nodes.
    #[error("no nodes available")]
    EmptyNodeList,
    /// Invalid router or ring configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Unrecognised operation name
    #[error("invalid operation '{0}', expected 'read' or 'write'")]
    InvalidOp(String),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
