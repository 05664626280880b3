//! Router configuration.

use crate::error::{Error, Result};
use crate::ring::consistent::DEFAULT_REPLICAS;
use crate::router::Schedule;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

pub const DEFAULT_THRESHOLD: u64 = 50;
pub const DEFAULT_WINDOW: u64 = 500;

/// Hot-key router settings.
///
/// Loadable from any serde format; missing fields take their defaults.
///
/// ```rust
/// use corelib::RouterConfig;
///
/// let config = RouterConfig::new(10, 5).with_replicas(50);
/// assert!(config.validate().is_ok());
/// assert!(RouterConfig::new(0, 5).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Reads after which a key is promoted.
    pub threshold: u64,
    /// Width of the guard phase and of each traffic-split epoch.
    pub window: u64,
    /// Virtual nodes per physical node on the internal ring.
    pub replicas: usize,
    /// Cap on tracked keys; least recently read keys are forgotten first.
    /// `None` tracks every key ever read.
    pub max_tracked_keys: Option<NonZeroUsize>,
}

impl RouterConfig {
    pub fn new(threshold: u64, window: u64) -> Self {
        Self {
            threshold,
            window,
            ..Self::default()
        }
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_max_tracked_keys(mut self, max: NonZeroUsize) -> Self {
        self.max_tracked_keys = Some(max);
        self
    }

    /// Reject zero threshold, window or replicas.
    ///
    /// Nothing is normalized: a zero here always means a misconfiguration.
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        if self.replicas == 0 {
            return Err(Error::config("replicas must be at least 1"));
        }
        Ok(())
    }

    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::new(self.threshold, self.window)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window: DEFAULT_WINDOW,
            replicas: DEFAULT_REPLICAS,
            max_tracked_keys: None,
        }
    }
}
