//! In-memory routing simulation.
//!
//! Every scheme is driven with the same Zipf request stream. Requests are
//! routed in pipelined batches and each batch is timed, so latency figures are
//! routing cost only. Per-node request counts stand in for server load.

use crate::algorithm::Algorithm;
use crate::error::{Result, WorkloadError};
use crate::stats::{load_stddev, load_summary, mean_std, weighted_percentile, MeanStd};
use crate::zipf::{seeded_rng, Request, ZipfWorkload};
use corelib::{KeyRouter, NodeId, Op, RingTopology, RouterConfig, SharedHotKeyRouter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

pub const KEY_PREFIX: &str = "key:";

/// Smallest D-HASH threshold used by the pipeline sweep.
pub const MIN_SWEEP_THRESHOLD: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Zipf skew.
    pub alpha: f64,
    pub num_keys: usize,
    /// Operations per run.
    pub ops: usize,
    /// Fraction of operations that are reads; the rest are writes.
    pub read_ratio: f64,
    pub seed: u64,
    pub repeats: usize,
    /// Operations routed per timed batch.
    pub pipeline_size: usize,
    pub router: RouterConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ops == 0 {
            return Err(WorkloadError::invalid("ops must be at least 1"));
        }
        if self.repeats == 0 {
            return Err(WorkloadError::invalid("repeats must be at least 1"));
        }
        if self.pipeline_size == 0 {
            return Err(WorkloadError::invalid("pipeline_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return Err(WorkloadError::invalid(format!(
                "read_ratio must lie in [0, 1], got {}",
                self.read_ratio
            )));
        }
        self.router.validate()?;
        Ok(())
    }

    pub fn workload(&self) -> Result<ZipfWorkload> {
        ZipfWorkload::new(self.alpha, self.num_keys)
    }

    /// Request stream of repeat `rep`, drawn with seed `seed + rep`.
    pub fn requests(&self, workload: &ZipfWorkload, rep: usize) -> Vec<Request> {
        let mut rng = seeded_rng(self.seed.wrapping_add(rep as u64));
        workload.sample_requests(&mut rng, self.ops, KEY_PREFIX, self.read_ratio)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 1.1,
            num_keys: 10_000,
            ops: 200_000,
            read_ratio: 0.95,
            seed: 1337,
            repeats: 3,
            pipeline_size: 500,
            router: RouterConfig {
                window: 1024,
                ..RouterConfig::default()
            },
        }
    }
}

/// Outcome of one routing run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub algorithm: String,
    pub ops: usize,
    pub writes: usize,
    pub throughput_ops_s: f64,
    pub avg_ns: f64,
    pub p50_ns: f64,
    pub p95_ns: f64,
    pub p99_ns: f64,
    pub load_stddev: f64,
    pub load_mean: f64,
    pub load_max: f64,
    pub load_min: f64,
    /// Largest single-node share of operations.
    pub max_node_share: f64,
    pub node_load: BTreeMap<NodeId, u64>,
}

/// Mean and spread of each metric over repeated runs.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub algorithm: String,
    pub alpha: f64,
    pub read_ratio: f64,
    pub repeats: usize,
    pub pipeline_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u64>,
    pub throughput_ops_s: MeanStd,
    pub avg_ns: MeanStd,
    pub p50_ns: MeanStd,
    pub p95_ns: MeanStd,
    pub p99_ns: MeanStd,
    pub load_stddev: MeanStd,
    pub load_mean: MeanStd,
    pub load_max: MeanStd,
    pub load_min: MeanStd,
    pub max_node_share: MeanStd,
}

/// Outcome of a multi-threaded run against a shared router.
#[derive(Debug, Clone, Serialize)]
pub struct ConcurrentMetrics {
    pub workers: usize,
    pub ops: usize,
    pub elapsed_ns: u64,
    pub throughput_ops_s: f64,
    pub load_stddev: f64,
    pub node_load: BTreeMap<NodeId, u64>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<NodeId>,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new<I>(nodes: I, config: SimulationConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().map(Into::into).collect();
        if nodes.is_empty() {
            return Err(corelib::Error::EmptyNodeList.into());
        }
        config.validate()?;
        Ok(Self { nodes, config })
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Same nodes under another configuration.
    fn with_config(&self, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: self.nodes.clone(),
            config,
        })
    }

    /// Route one request stream through `router`.
    ///
    /// Every distinct key is written once first; those writes are neither
    /// timed nor counted as load. Reads and writes of the stream both count.
    pub fn run(&self, router: &mut dyn KeyRouter, requests: &[Request]) -> Result<RunMetrics> {
        let mut seen = HashSet::new();
        for request in requests {
            if seen.insert(request.key.as_str()) {
                router.route(&request.key, Op::Write)?;
            }
        }
        debug!(algorithm = router.name(), distinct = seen.len(), "warm-up done");

        let mut load: HashMap<NodeId, u64> = HashMap::new();
        let mut samples = Vec::with_capacity(requests.len() / self.config.pipeline_size + 1);
        let mut total_ns = 0u128;
        for batch in requests.chunks(self.config.pipeline_size) {
            let mut routed = Vec::with_capacity(batch.len());
            let start = Instant::now();
            for request in batch {
                routed.push(router.route(&request.key, request.op)?);
            }
            let elapsed = start.elapsed().as_nanos();
            total_ns += elapsed;
            samples.push((elapsed as f64 / batch.len() as f64, batch.len() as u64));
            for node in routed {
                *load.entry(node).or_insert(0) += 1;
            }
        }

        let ops = requests.len();
        let total_secs = total_ns as f64 / 1e9;
        let summary = load_summary(&load, &self.nodes);
        let max_load = load.values().copied().max().unwrap_or(0);
        let metrics = RunMetrics {
            algorithm: router.name().to_owned(),
            ops,
            writes: requests.iter().filter(|r| r.op == Op::Write).count(),
            throughput_ops_s: if total_secs > 0.0 { ops as f64 / total_secs } else { 0.0 },
            avg_ns: if ops > 0 { total_ns as f64 / ops as f64 } else { 0.0 },
            p50_ns: weighted_percentile(&samples, 0.50),
            p95_ns: weighted_percentile(&samples, 0.95),
            p99_ns: weighted_percentile(&samples, 0.99),
            load_stddev: load_stddev(&load, &self.nodes),
            load_mean: summary.mean,
            load_max: summary.max,
            load_min: summary.min,
            max_node_share: if ops > 0 { max_load as f64 / ops as f64 } else { 0.0 },
            node_load: self.full_load(load),
        };
        info!(
            algorithm = %metrics.algorithm,
            ops,
            writes = metrics.writes,
            throughput = metrics.throughput_ops_s,
            p99_ns = metrics.p99_ns,
            load_stddev = metrics.load_stddev,
            "run complete"
        );
        Ok(metrics)
    }

    /// Run every algorithm `repeats` times.
    ///
    /// Repeat `rep` samples its requests with seed `seed + rep`; all
    /// algorithms in one repeat see the same stream.
    pub fn run_repeated(
        &self,
        algorithms: &[Algorithm],
        workload: &ZipfWorkload,
    ) -> Result<Vec<AggregateRow>> {
        let mut runs: Vec<Vec<RunMetrics>> = vec![Vec::new(); algorithms.len()];
        for rep in 0..self.config.repeats {
            let requests = self.config.requests(workload, rep);
            for (slot, algorithm) in algorithms.iter().enumerate() {
                let mut router = algorithm.build(&self.nodes, &self.config)?;
                runs[slot].push(self.run(router.as_mut(), &requests)?);
            }
        }

        Ok(algorithms
            .iter()
            .zip(&runs)
            .map(|(algorithm, runs)| self.aggregate(*algorithm, workload, runs))
            .collect())
    }

    /// Sweep the D-HASH promotion threshold, keeping the configured window.
    pub fn ablation(
        &self,
        thresholds: &[u64],
        workload: &ZipfWorkload,
    ) -> Result<Vec<AggregateRow>> {
        let mut rows = Vec::with_capacity(thresholds.len());
        for &threshold in thresholds {
            let mut config = self.config.clone();
            config.router.threshold = threshold;
            info!(threshold, "ablation step");
            rows.extend(self.with_config(config)?.run_repeated(&[Algorithm::DHash], workload)?);
        }
        Ok(rows)
    }

    /// Sweep the pipeline size `B`.
    ///
    /// D-HASH follows the batch: its window is `B` and its threshold is
    /// `max(30, B)`.
    pub fn pipeline_sweep(
        &self,
        algorithms: &[Algorithm],
        pipelines: &[usize],
        workload: &ZipfWorkload,
    ) -> Result<Vec<AggregateRow>> {
        let mut rows = Vec::with_capacity(pipelines.len() * algorithms.len());
        for &pipeline in pipelines {
            let batch = pipeline as u64;
            let mut config = self.config.clone();
            config.pipeline_size = pipeline;
            config.router.window = batch;
            config.router.threshold = batch.max(MIN_SWEEP_THRESHOLD);
            info!(pipeline, "pipeline sweep step");
            rows.extend(self.with_config(config)?.run_repeated(algorithms, workload)?);
        }
        Ok(rows)
    }

    /// Sweep the Zipf skew over `alphas` with a fresh workload per alpha.
    pub fn alpha_sweep(&self, algorithms: &[Algorithm], alphas: &[f64]) -> Result<Vec<AggregateRow>> {
        let mut rows = Vec::with_capacity(alphas.len() * algorithms.len());
        for &alpha in alphas {
            let mut config = self.config.clone();
            config.alpha = alpha;
            let sim = self.with_config(config)?;
            let workload = sim.config.workload()?;
            info!(alpha, "alpha sweep step");
            rows.extend(sim.run_repeated(algorithms, &workload)?);
        }
        Ok(rows)
    }

    /// Split `requests` over `workers` scoped threads sharing one router.
    pub fn run_concurrent<R: RingTopology>(
        &self,
        router: &SharedHotKeyRouter<R>,
        requests: &[Request],
        workers: usize,
    ) -> Result<ConcurrentMetrics> {
        if workers == 0 {
            return Err(WorkloadError::invalid("workers must be at least 1"));
        }
        let chunk = requests.len().div_ceil(workers).max(1);

        let start = Instant::now();
        let partials = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = requests
                .chunks(chunk)
                .map(|part| {
                    s.spawn(move |_| -> Result<HashMap<NodeId, u64>> {
                        let mut load = HashMap::new();
                        for request in part {
                            let node = router.get_node(&request.key, request.op)?;
                            *load.entry(node).or_insert(0) += 1;
                        }
                        Ok(load)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| WorkloadError::WorkerPanicked))
                .collect::<Vec<_>>()
        })
        .map_err(|_| WorkloadError::WorkerPanicked)?;
        let elapsed = start.elapsed();

        let mut load: HashMap<NodeId, u64> = HashMap::new();
        for partial in partials {
            for (node, count) in partial?? {
                *load.entry(node).or_insert(0) += count;
            }
        }

        let secs = elapsed.as_secs_f64();
        let metrics = ConcurrentMetrics {
            workers,
            ops: requests.len(),
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            throughput_ops_s: if secs > 0.0 { requests.len() as f64 / secs } else { 0.0 },
            load_stddev: load_stddev(&load, &self.nodes),
            node_load: self.full_load(load),
        };
        info!(
            workers,
            ops = metrics.ops,
            throughput = metrics.throughput_ops_s,
            "concurrent run complete"
        );
        Ok(metrics)
    }

    fn aggregate(
        &self,
        algorithm: Algorithm,
        workload: &ZipfWorkload,
        runs: &[RunMetrics],
    ) -> AggregateRow {
        let column = |f: fn(&RunMetrics) -> f64| -> MeanStd {
            mean_std(&runs.iter().map(f).collect::<Vec<_>>())
        };
        let (threshold, window) = match algorithm {
            Algorithm::DHash => (
                Some(self.config.router.threshold),
                Some(self.config.router.window),
            ),
            _ => (None, None),
        };
        AggregateRow {
            algorithm: algorithm.display_name().to_owned(),
            alpha: workload.alpha(),
            read_ratio: self.config.read_ratio,
            repeats: runs.len(),
            pipeline_size: self.config.pipeline_size,
            threshold,
            window,
            throughput_ops_s: column(|m| m.throughput_ops_s),
            avg_ns: column(|m| m.avg_ns),
            p50_ns: column(|m| m.p50_ns),
            p95_ns: column(|m| m.p95_ns),
            p99_ns: column(|m| m.p99_ns),
            load_stddev: column(|m| m.load_stddev),
            load_mean: column(|m| m.load_mean),
            load_max: column(|m| m.load_max),
            load_min: column(|m| m.load_min),
            max_node_share: column(|m| m.max_node_share),
        }
    }

    /// Per-node load with idle nodes listed as zero.
    fn full_load(&self, mut load: HashMap<NodeId, u64>) -> BTreeMap<NodeId, u64> {
        self.nodes
            .iter()
            .map(|node| (node.clone(), load.remove(node).unwrap_or(0)))
            .collect()
    }
}
