//! Command-line flags and the cluster file.

use crate::commands::Command;
use anyhow::{Context, Result};
use clap::Parser;
use corelib::{node_ids, NodeId, RouterConfig};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_NODES: [&str; 5] = ["redis-1", "redis-2", "redis-3", "redis-4", "redis-5"];

#[derive(Debug, Parser)]
#[command(name = "dhash", version, about = "Hot-key aware routing over consistent hashing")]
pub struct CliConfig {
    /// Cluster file (TOML) with `nodes` and a `[router]` section
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    pub fn cluster(&self) -> Result<ClusterConfig> {
        match &self.config {
            Some(path) => ClusterConfig::load(path),
            None => Ok(ClusterConfig::default()),
        }
    }

    pub fn run(&self) -> Result<()> {
        let cluster = self.cluster()?;
        let stdout = std::io::stdout();
        self.execute(&cluster, &mut stdout.lock())
    }

    pub fn execute(&self, cluster: &ClusterConfig, out: &mut impl Write) -> Result<()> {
        self.command.execute(cluster, out)
    }
}

/// Cluster description shared by all commands.
///
/// ```toml
/// nodes = ["redis-1", "redis-2", "redis-3"]
///
/// [router]
/// threshold = 50
/// window = 500
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    pub nodes: Vec<String>,
    pub router: RouterConfig,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading cluster file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing cluster file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.router.validate()?;
        if config.nodes.is_empty() {
            anyhow::bail!("cluster file lists no nodes");
        }
        Ok(config)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        node_ids(&self.nodes)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: DEFAULT_NODES.iter().map(|n| n.to_string()).collect(),
            router: RouterConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cluster_file() {
        let cluster = ClusterConfig::parse(
            r#"
            nodes = ["a", "b"]

            [router]
            threshold = 10
            "#,
        )
        .unwrap();
        assert_eq!(cluster.nodes, ["a", "b"]);
        assert_eq!(cluster.router.threshold, 10);
        assert_eq!(cluster.router.window, 500);
    }

    #[test]
    fn test_parse_rejects_bad_files() {
        assert!(ClusterConfig::parse("nodes = []").is_err());
        assert!(ClusterConfig::parse("nodes = [\"a\"]\n[router]\nwindow = 0").is_err());
        assert!(ClusterConfig::parse("nodez = [\"a\"]").is_err());
    }

    #[test]
    fn test_default_cluster() {
        let cluster = ClusterConfig::default();
        assert_eq!(cluster.nodes.len(), 5);
        assert_eq!(cluster.node_ids()[0], "redis-1");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = CliConfig::try_parse_from(["dhash", "route", "--key", "k", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.default_log_filter(), "debug");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        CliConfig::command().debug_assert();
    }
}
