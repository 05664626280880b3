//! Core library for client-side hot-key aware routing.
//!
//! This crate provides:
//! - The 64-bit hash primitive every scheme is built on
//! - Consistent hash rings, uniform and weighted
//! - Rendezvous (highest random weight) selection
//! - The D-HASH hot-key router, which offloads reads of hot keys from their
//!   primary node to a fixed alternate node in alternating windows
//!
//! Everything here is synchronous CPU work with no I/O. The caller performs
//! the actual store access against the node it gets back.

pub mod config;
pub mod error;
pub mod hash;
pub mod node;
pub mod rendezvous;
pub mod ring;
pub mod router;
pub mod token;
pub mod vnode;

pub use config::RouterConfig;
pub use error::{Error, Result};
pub use hash::hash64;
pub use node::{node_ids, NodeId};
pub use rendezvous::RendezvousSelector;
pub use ring::{ConsistentHashRing, RingBuilder, RingTopology, WeightedConsistentHashRing};
pub use router::{HotKeyRouter, KeyRouter, Op, Phase, Schedule, SharedHotKeyRouter, Target};
pub use token::Token;
pub use vnode::VirtualNode;
