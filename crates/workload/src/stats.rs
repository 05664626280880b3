//! Summary statistics for simulation runs.

use corelib::NodeId;
use serde::Serialize;
use std::collections::HashMap;

/// Percentile over `(value, weight)` samples.
///
/// A pipelined batch yields one per-op latency standing for `weight`
/// operations. Samples are sorted by value and the result is interpolated
/// linearly between the previous value and the sample where cumulative weight
/// crosses `q * total`. Empty input or zero total weight gives 0.0.
pub fn weighted_percentile(samples: &[(f64, u64)], q: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: u64 = sorted.iter().map(|&(_, w)| w).sum();
    if total == 0 {
        return 0.0;
    }

    let target = q * total as f64;
    let mut cum = 0.0;
    let mut prev = sorted[0].0;
    for &(value, weight) in &sorted {
        let next = cum + weight as f64;
        if next >= target {
            if weight == 0 {
                return value;
            }
            let frac = (target - cum) / weight as f64;
            return prev + (value - prev) * frac;
        }
        prev = value;
        cum = next;
    }
    sorted[sorted.len() - 1].0
}

/// Sample standard deviation of request counts across `nodes`.
///
/// Nodes absent from `load` count as zero.
pub fn load_stddev(load: &HashMap<NodeId, u64>, nodes: &[NodeId]) -> f64 {
    let values: Vec<f64> = nodes
        .iter()
        .map(|n| load.get(n).copied().unwrap_or(0) as f64)
        .collect();
    mean_std(&values).std
}

/// Mean, max and min of per-node request counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadSummary {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Summary of request counts across `nodes`; missing nodes count as zero.
pub fn load_summary(load: &HashMap<NodeId, u64>, nodes: &[NodeId]) -> LoadSummary {
    if nodes.is_empty() {
        return LoadSummary { mean: 0.0, max: 0.0, min: 0.0 };
    }
    let values = nodes.iter().map(|n| load.get(n).copied().unwrap_or(0) as f64);
    let (sum, max, min) = values.fold((0.0, f64::MIN, f64::MAX), |(sum, max, min), v| {
        (sum + v, max.max(v), min.min(v))
    });
    LoadSummary {
        mean: sum / nodes.len() as f64,
        max,
        min,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

/// Mean and sample standard deviation; std is 0.0 below two samples.
pub fn mean_std(xs: &[f64]) -> MeanStd {
    if xs.is_empty() {
        return MeanStd { mean: 0.0, std: 0.0 };
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let std = if xs.len() > 1 {
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    MeanStd { mean, std }
}
