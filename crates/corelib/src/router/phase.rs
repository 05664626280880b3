//! Guard and window arithmetic.
//!
//! With `delta = max(0, count - threshold)`:
//!
//! - guard while `delta < window`
//! - otherwise `epoch = (delta - window) / window`; even epochs read from the
//!   alternate, odd epochs from the primary
//!
//! The guard and epoch 0 are both `window` reads wide, so the first alternate
//! read is read number `threshold + window`.

use crate::error::{Error, Result};
use std::num::NonZeroU64;

/// Where a read should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Primary,
    Alternate,
}

/// Routing phase of a key after a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Below threshold and never promoted.
    Cold,
    /// Promoted, still inside the first `window` reads.
    Guard,
    /// Even epoch.
    Alternate,
    /// Odd epoch.
    Primary,
}

impl Phase {
    #[inline]
    pub fn target(self) -> Target {
        match self {
            Phase::Alternate => Target::Alternate,
            Phase::Cold | Phase::Guard | Phase::Primary => Target::Primary,
        }
    }

    #[inline]
    pub fn is_hot(self) -> bool {
        !matches!(self, Phase::Cold)
    }
}

/// Validated threshold and window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    threshold: u64,
    window: NonZeroU64,
}

impl Schedule {
    pub fn new(threshold: u64, window: u64) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::config("threshold must be at least 1"));
        }
        let window =
            NonZeroU64::new(window).ok_or_else(|| Error::config("window must be at least 1"))?;
        Ok(Self { threshold, window })
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn window(&self) -> u64 {
        self.window.get()
    }

    /// Reads since the promotion boundary.
    #[inline]
    pub fn delta(&self, count: u64) -> u64 {
        count.saturating_sub(self.threshold)
    }

    #[inline]
    pub fn in_guard_phase(&self, count: u64) -> bool {
        self.delta(count) < self.window.get()
    }

    /// Window split for a promoted key, guard included.
    #[inline]
    pub fn window_target(&self, count: u64) -> Target {
        let delta = self.delta(count);
        let window = self.window.get();
        if delta < window {
            return Target::Primary;
        }
        let epoch = (delta - window) / window;
        if epoch % 2 == 0 {
            Target::Alternate
        } else {
            Target::Primary
        }
    }

    /// Phase after the `count`-th read of a key.
    #[inline]
    pub fn phase(&self, count: u64, promoted: bool) -> Phase {
        if count < self.threshold && !promoted {
            return Phase::Cold;
        }
        if self.in_guard_phase(count) {
            return Phase::Guard;
        }
        match self.window_target(count) {
            Target::Alternate => Phase::Alternate,
            Target::Primary => Phase::Primary,
        }
    }
}
