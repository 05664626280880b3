//! The `dhash` command-line tool.
//!
//! Provides commands for:
//! - Routing single keys through the hot-key router
//! - Comparing routing schemes on Zipf workloads
//! - Sweeping the promotion threshold, pipeline size and Zipf skew

pub mod commands;
pub mod config;

pub use commands::{
    AblationArgs, Command, PipelineSweepArgs, RouteArgs, SimulateArgs, WorkloadArgs, ZipfSweepArgs,
};
pub use config::{CliConfig, ClusterConfig};
