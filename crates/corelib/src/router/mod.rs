//! Hot-key aware routing (D-HASH).
//!
//! The router wraps a consistent hash ring. Writes always go to a key's
//! primary node. Reads are counted per key; once a key's count reaches the
//! threshold it is promoted and given a fixed alternate node. After a guard
//! period of `window` further reads, read traffic alternates between the
//! alternate and the primary in `window`-sized bursts.
//!
//! ```text
//!  count:  1 .. T-1 | T .. T+W-1 | T+W .. T+2W-1 | T+2W .. T+3W-1 | ...
//!  target: primary  | primary    | alternate     | primary        | ...
//!          (cold)     (guard)      (epoch 0)       (epoch 1)
//! ```

pub mod alternate;
pub mod hot_key;
pub mod phase;
pub mod shared;
mod state;

pub use alternate::resolve_alternate;
pub use hot_key::HotKeyRouter;
pub use phase::{Phase, Schedule, Target};
pub use shared::SharedHotKeyRouter;
pub use state::KeyState;

use crate::error::{Error, Result};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of request being routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Read,
    Write,
}

impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("read") {
            Ok(Op::Read)
        } else if s.eq_ignore_ascii_case("write") {
            Ok(Op::Write)
        } else {
            Err(Error::InvalidOp(s.to_owned()))
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::Read => "read",
            Op::Write => "write",
        })
    }
}

/// Anything that maps a key and an operation to a node.
///
/// Implemented by every routing scheme so benchmarks can drive them through
/// one interface. Stateless schemes ignore `op`.
pub trait KeyRouter {
    fn route(&mut self, key: &str, op: Op) -> Result<NodeId>;

    /// Display name used in reports.
    fn name(&self) -> &'static str;
}

impl<R: KeyRouter + ?Sized> KeyRouter for Box<R> {
    fn route(&mut self, key: &str, op: Op) -> Result<NodeId> {
        (**self).route(key, op)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
