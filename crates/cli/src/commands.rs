//! Subcommands.

use crate::config::ClusterConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use corelib::{node_ids, HotKeyRouter, NodeId, Op, RouterConfig, SharedHotKeyRouter};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use workload::{render_table, write_json, AggregateRow, Algorithm, Simulation, SimulationConfig};

pub const DEFAULT_ABLATION_THRESHOLDS: [u64; 5] = [100, 200, 300, 500, 800];
pub const DEFAULT_PIPELINES: [usize; 5] = [50, 100, 200, 500, 1000];
pub const DEFAULT_ALPHAS: [f64; 3] = [1.1, 1.3, 1.5];
pub const ALL_ALGORITHMS: &str = "ch,wch,hrw,dhash";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route one key, optionally several times to watch it get promoted
    Route(RouteArgs),
    /// Compare routing schemes on a Zipf workload
    Simulate(SimulateArgs),
    /// Sweep the D-HASH promotion threshold
    Ablation(AblationArgs),
    /// Sweep the pipeline size; D-HASH uses W = B and T = max(30, B)
    PipelineSweep(PipelineSweepArgs),
    /// Sweep the Zipf skew
    ZipfSweep(ZipfSweepArgs),
}

impl Command {
    pub fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        match self {
            Command::Route(args) => args.execute(cluster, out),
            Command::Simulate(args) => args.execute(cluster, out),
            Command::Ablation(args) => args.execute(cluster, out),
            Command::PipelineSweep(args) => args.execute(cluster, out),
            Command::ZipfSweep(args) => args.execute(cluster, out),
        }
    }
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    #[arg(long)]
    pub key: String,

    #[arg(long, default_value = "read")]
    pub op: Op,

    #[arg(long)]
    pub threshold: Option<u64>,

    #[arg(long)]
    pub window: Option<u64>,

    /// Comma-separated node list, overriding the cluster file
    #[arg(long, value_delimiter = ',')]
    pub nodes: Option<Vec<String>>,

    /// Number of times to route the key
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,
}

impl RouteArgs {
    fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        let nodes = resolve_nodes(cluster, self.nodes.as_deref());
        let config = router_config(&cluster.router, self.threshold, self.window);
        info!(key = %self.key, op = %self.op, repeat = self.repeat, "routing key");
        let mut router = HotKeyRouter::new(nodes, config)?;

        for _ in 0..self.repeat {
            let start = Instant::now();
            let node = router.get_node(&self.key, self.op)?;
            let elapsed = start.elapsed();
            writeln!(out, "{} {} -> {} ({} ns)", self.op, self.key, node, elapsed.as_nanos())?;
        }
        if self.op == Op::Read {
            let alternate = router.alternate(&self.key).map(NodeId::to_string);
            writeln!(
                out,
                "reads={} primary={} alternate={}",
                router.read_count(&self.key),
                router.primary(&self.key)?,
                alternate.as_deref().unwrap_or("-"),
            )?;
        }
        Ok(())
    }
}

/// Workload flags shared by `simulate` and `ablation`; unset flags keep the
/// library defaults.
#[derive(Debug, Args)]
pub struct WorkloadArgs {
    #[arg(long)]
    pub alpha: Option<f64>,

    #[arg(long)]
    pub num_keys: Option<usize>,

    #[arg(long)]
    pub ops: Option<usize>,

    /// Fraction of operations that are reads
    #[arg(long)]
    pub read_ratio: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub repeats: Option<usize>,

    /// Reads per timed batch
    #[arg(long)]
    pub pipeline: Option<usize>,

    #[arg(long)]
    pub window: Option<u64>,

    /// Write aggregate rows as JSON
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl WorkloadArgs {
    pub fn simulation_config(&self, cluster: &ClusterConfig) -> SimulationConfig {
        let defaults = SimulationConfig::default();
        SimulationConfig {
            alpha: self.alpha.unwrap_or(defaults.alpha),
            num_keys: self.num_keys.unwrap_or(defaults.num_keys),
            ops: self.ops.unwrap_or(defaults.ops),
            read_ratio: self.read_ratio.unwrap_or(defaults.read_ratio),
            seed: self.seed.unwrap_or(defaults.seed),
            repeats: self.repeats.unwrap_or(defaults.repeats),
            pipeline_size: self.pipeline.unwrap_or(defaults.pipeline_size),
            router: router_config(&cluster.router, None, self.window),
        }
    }

    fn emit(&self, rows: &[AggregateRow], out: &mut impl Write) -> Result<()> {
        write!(out, "{}", render_table(rows))?;
        if let Some(path) = &self.out {
            write_json(path, &rows).with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "wrote {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Comma-separated schemes: ch, wch, hrw, dhash
    #[arg(long, default_value = ALL_ALGORITHMS)]
    pub algos: String,

    #[arg(long)]
    pub threshold: Option<u64>,

    /// Also replay the first workload on a shared router with this many threads
    #[arg(long)]
    pub workers: Option<usize>,
}

impl SimulateArgs {
    fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        let algorithms = Algorithm::parse_list(&self.algos)?;
        let mut config = self.workload.simulation_config(cluster);
        if let Some(threshold) = self.threshold {
            config.router.threshold = threshold;
        }

        let sim = Simulation::new(cluster.node_ids(), config)?;
        info!(algorithms = %self.algos, alpha = sim.config().alpha, "simulating");
        let zipf = sim.config().workload()?;
        let rows = sim.run_repeated(&algorithms, &zipf)?;
        self.workload.emit(&rows, out)?;

        if let Some(workers) = self.workers {
            let requests = sim.config().requests(&zipf, 0);
            let router = SharedHotKeyRouter::new(sim.nodes().to_vec(), sim.config().router.clone())?;
            let metrics = sim.run_concurrent(&router, &requests, workers)?;
            writeln!(
                out,
                "shared D-HASH, {} workers: {:.0} ops/s, load sd {:.1}",
                metrics.workers, metrics.throughput_ops_s, metrics.load_stddev
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct AblationArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Comma-separated thresholds to sweep
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_ABLATION_THRESHOLDS)]
    pub thresholds: Vec<u64>,
}

impl AblationArgs {
    fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        let sim = Simulation::new(cluster.node_ids(), self.workload.simulation_config(cluster))?;
        info!(thresholds = ?self.thresholds, "threshold sweep");
        let zipf = sim.config().workload()?;
        let rows = sim.ablation(&self.thresholds, &zipf)?;
        self.workload.emit(&rows, out)
    }
}

#[derive(Debug, Args)]
pub struct PipelineSweepArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Comma-separated schemes: ch, wch, hrw, dhash
    #[arg(long, default_value = ALL_ALGORITHMS)]
    pub algos: String,

    /// Comma-separated pipeline sizes
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_PIPELINES)]
    pub pipelines: Vec<usize>,
}

impl PipelineSweepArgs {
    fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        let algorithms = Algorithm::parse_list(&self.algos)?;
        let sim = Simulation::new(cluster.node_ids(), self.workload.simulation_config(cluster))?;
        info!(pipelines = ?self.pipelines, "pipeline sweep");
        let zipf = sim.config().workload()?;
        let rows = sim.pipeline_sweep(&algorithms, &self.pipelines, &zipf)?;
        self.workload.emit(&rows, out)
    }
}

#[derive(Debug, Args)]
pub struct ZipfSweepArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Comma-separated schemes: ch, wch, hrw, dhash
    #[arg(long, default_value = ALL_ALGORITHMS)]
    pub algos: String,

    /// Comma-separated Zipf alphas
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_ALPHAS)]
    pub alphas: Vec<f64>,
}

impl ZipfSweepArgs {
    fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        let algorithms = Algorithm::parse_list(&self.algos)?;
        let sim = Simulation::new(cluster.node_ids(), self.workload.simulation_config(cluster))?;
        info!(alphas = ?self.alphas, "zipf sweep");
        let rows = sim.alpha_sweep(&algorithms, &self.alphas)?;
        self.workload.emit(&rows, out)
    }
}

fn resolve_nodes(cluster: &ClusterConfig, nodes: Option<&[String]>) -> Vec<NodeId> {
    match nodes {
        Some(nodes) if !nodes.is_empty() => node_ids(nodes),
        _ => cluster.node_ids(),
    }
}

fn router_config(base: &RouterConfig, threshold: Option<u64>, window: Option<u64>) -> RouterConfig {
    let mut config = base.clone();
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    if let Some(window) = window {
        config.window = window;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliConfig;
    use clap::Parser;

    fn run(args: &[&str]) -> Result<String> {
        let cli = CliConfig::try_parse_from(std::iter::once("dhash").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        cli.execute(&ClusterConfig::default(), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_route_prints_one_line_per_call() {
        let out = run(&["route", "--key", "user:1", "--repeat", "3"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("read user:1 -> redis-"));
        assert!(lines[3].starts_with("reads=3 "));
    }

    #[test]
    fn test_route_promotes_after_threshold() {
        let out = run(&[
            "route", "--key", "hot", "--threshold", "2", "--window", "1", "--nodes", "a,b",
            "--repeat", "4",
        ])
        .unwrap();
        let summary = out.lines().last().unwrap();
        assert!(summary.starts_with("reads=4 "));
        assert!(!summary.ends_with("alternate=-"));
    }

    #[test]
    fn test_route_write_skips_summary() {
        let out = run(&["route", "--key", "k", "--op", "WRITE"]).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("write k -> "));
    }

    #[test]
    fn test_route_rejects_zero_window() {
        assert!(run(&["route", "--key", "k", "--window", "0"]).is_err());
        assert!(run(&["route", "--key", "k", "--op", "delete"]).is_err());
    }

    #[test]
    fn test_simulate_small_run() {
        let out = run(&[
            "simulate", "--ops", "500", "--num-keys", "50", "--repeats", "1", "--pipeline", "50",
            "--algos", "ch,dhash", "--workers", "2",
        ])
        .unwrap();
        assert!(out.contains("Consistent Hashing"));
        assert!(out.contains("D-HASH"));
        assert!(out.contains("shared D-HASH, 2 workers"));
        assert!(run(&["simulate", "--algos", "maglev"]).is_err());
    }

    #[test]
    fn test_ablation_default_thresholds() {
        let cli = CliConfig::try_parse_from(["dhash", "ablation"]).unwrap();
        match cli.command {
            Command::Ablation(args) => assert_eq!(args.thresholds, DEFAULT_ABLATION_THRESHOLDS),
            other => panic!("unexpected command {other:?}"),
        }

        let out = run(&[
            "ablation", "--thresholds", "5,10", "--ops", "300", "--num-keys", "30",
            "--repeats", "1", "--pipeline", "30",
        ])
        .unwrap();
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_simulate_read_ratio_flag() {
        let cli = CliConfig::try_parse_from(["dhash", "simulate", "--read-ratio", "0.5"]).unwrap();
        match cli.command {
            Command::Simulate(args) => {
                let config = args.workload.simulation_config(&ClusterConfig::default());
                assert_eq!(config.read_ratio, 0.5);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let out = run(&[
            "simulate", "--ops", "300", "--num-keys", "30", "--repeats", "1", "--pipeline", "30",
            "--read-ratio", "0", "--algos", "dhash",
        ])
        .unwrap();
        assert!(out.contains("D-HASH"));
        assert!(run(&["simulate", "--read-ratio", "1.5", "--ops", "10"]).is_err());
    }

    #[test]
    fn test_pipeline_sweep_rows() {
        let cli = CliConfig::try_parse_from(["dhash", "pipeline-sweep"]).unwrap();
        match cli.command {
            Command::PipelineSweep(args) => assert_eq!(args.pipelines, DEFAULT_PIPELINES),
            other => panic!("unexpected command {other:?}"),
        }

        let out = run(&[
            "pipeline-sweep", "--pipelines", "10,40", "--algos", "ch,dhash", "--ops", "200",
            "--num-keys", "20", "--repeats", "1",
        ])
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        // D-HASH at B=10 runs with T=30 and W=10
        assert!(lines[2].starts_with("D-HASH"));
        assert!(lines[2].contains(" 30 ") && lines[2].contains(" 10 "));
    }

    #[test]
    fn test_zipf_sweep_rows() {
        let cli = CliConfig::try_parse_from(["dhash", "zipf-sweep"]).unwrap();
        match cli.command {
            Command::ZipfSweep(args) => assert_eq!(args.alphas, DEFAULT_ALPHAS),
            other => panic!("unexpected command {other:?}"),
        }

        let out = run(&[
            "zipf-sweep", "--alphas", "0.9,1.4", "--algos", "hrw", "--ops", "200",
            "--num-keys", "20", "--repeats", "1", "--pipeline", "50",
        ])
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("0.90"));
        assert!(lines[2].contains("1.40"));
        assert!(run(&["zipf-sweep", "--alphas", "0", "--ops", "10"]).is_err());
    }
}
