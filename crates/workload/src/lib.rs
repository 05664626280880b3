//! Workloads and simulations for the corelib routers.
//!
//! Zipf key streams feed every routing scheme through the same harness, which
//! reports routing latency and per-node load balance.

pub mod algorithm;
pub mod error;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod zipf;

pub use algorithm::Algorithm;
pub use error::{Result, WorkloadError};
pub use report::{render_table, write_json};
pub use simulation::{
    AggregateRow, ConcurrentMetrics, RunMetrics, Simulation, SimulationConfig, KEY_PREFIX,
    MIN_SWEEP_THRESHOLD,
};
pub use stats::{
    load_stddev, load_summary, mean_std, weighted_percentile, LoadSummary, MeanStd,
};
pub use zipf::{seeded_rng, Request, ZipfWorkload};
