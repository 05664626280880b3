//! Zipf-distributed key streams.
//!
//! Rank `i` (1-based) is drawn with probability proportional to `i^-alpha`.
//! The generator never owns randomness: callers pass the RNG, so a seed fully
//! determines the stream and nothing is shared between runs.

use crate::error::{Result, WorkloadError};
use corelib::Op;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Deterministic RNG for a seed.
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// One routed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub key: String,
    pub op: Op,
}

impl Request {
    pub fn read(key: impl Into<String>) -> Self {
        Self { key: key.into(), op: Op::Read }
    }

    pub fn write(key: impl Into<String>) -> Self {
        Self { key: key.into(), op: Op::Write }
    }
}

#[derive(Debug, Clone)]
pub struct ZipfWorkload {
    alpha: f64,
    pmf: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl ZipfWorkload {
    pub fn new(alpha: f64, num_keys: usize) -> Result<Self> {
        if num_keys == 0 {
            return Err(WorkloadError::invalid("num_keys must be at least 1"));
        }
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(WorkloadError::invalid(format!(
                "alpha must be a positive number, got {alpha}"
            )));
        }

        let weights: Vec<f64> = (1..=num_keys).map(|rank| (rank as f64).powf(-alpha)).collect();
        let total: f64 = weights.iter().sum();
        let pmf: Vec<f64> = weights.iter().map(|w| w / total).collect();
        let index = WeightedIndex::new(&weights)?;
        Ok(Self { alpha, pmf, index })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn num_keys(&self) -> usize {
        self.pmf.len()
    }

    /// Probability of each rank, hottest first.
    pub fn pmf(&self) -> &[f64] {
        &self.pmf
    }

    /// Draw `n` zero-based key indices.
    pub fn sample_indices<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.index.sample(rng)).collect()
    }

    /// Draw `n` keys named `"{prefix}{index}"`.
    pub fn sample_keys<R: Rng + ?Sized>(&self, rng: &mut R, n: usize, prefix: &str) -> Vec<String> {
        (0..n)
            .map(|_| format!("{prefix}{}", self.index.sample(rng)))
            .collect()
    }

    /// Draw `n` requests: keys first, then one uniform draw per op that
    /// makes it a read when below `read_ratio`.
    pub fn sample_requests<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        prefix: &str,
        read_ratio: f64,
    ) -> Vec<Request> {
        let keys = self.sample_keys(rng, n, prefix);
        keys.into_iter()
            .map(|key| {
                let op = if rng.gen::<f64>() < read_ratio { Op::Read } else { Op::Write };
                Request { key, op }
            })
            .collect()
    }

    /// Expected share of traffic going to the `k` hottest keys.
    pub fn topk_expected_mass(&self, k: usize) -> f64 {
        self.pmf[..k.min(self.pmf.len())].iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmf_sums_to_one_and_decreases() {
        let zipf = ZipfWorkload::new(1.1, 1_000).unwrap();
        let sum: f64 = zipf.pmf().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(zipf.pmf().windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let zipf = ZipfWorkload::new(1.3, 500).unwrap();
        let a = zipf.sample_keys(&mut seeded_rng(7), 1_000, "k");
        let b = zipf.sample_keys(&mut seeded_rng(7), 1_000, "k");
        let c = zipf.sample_keys(&mut seeded_rng(8), 1_000, "k");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hottest_key_dominates() {
        let zipf = ZipfWorkload::new(1.5, 1_000).unwrap();
        let idx = zipf.sample_indices(&mut seeded_rng(1), 20_000);
        let hottest = idx.iter().filter(|&&i| i == 0).count() as f64 / 20_000.0;
        assert!((hottest - zipf.pmf()[0]).abs() < 0.02, "hottest share {hottest}");
        assert!(idx.iter().all(|&i| i < 1_000));
    }

    #[test]
    fn test_read_ratio_controls_op_mix() {
        let zipf = ZipfWorkload::new(1.1, 100).unwrap();
        let all_reads = zipf.sample_requests(&mut seeded_rng(3), 500, "k", 1.0);
        assert!(all_reads.iter().all(|r| r.op == Op::Read));
        let all_writes = zipf.sample_requests(&mut seeded_rng(3), 500, "k", 0.0);
        assert!(all_writes.iter().all(|r| r.op == Op::Write));

        let mixed = zipf.sample_requests(&mut seeded_rng(3), 10_000, "k", 0.8);
        let reads = mixed.iter().filter(|r| r.op == Op::Read).count() as f64 / 10_000.0;
        assert!((reads - 0.8).abs() < 0.03, "read share {reads}");

        // the key stream does not depend on the mix
        let keys: Vec<_> = mixed.into_iter().take(500).map(|r| r.key).collect();
        let same: Vec<_> = all_writes.into_iter().map(|r| r.key).collect();
        assert_eq!(keys[..], same[..]);
    }

    #[test]
    fn test_topk_mass() {
        let zipf = ZipfWorkload::new(1.1, 100).unwrap();
        assert_eq!(zipf.topk_expected_mass(0), 0.0);
        assert!((zipf.topk_expected_mass(100) - 1.0).abs() < 1e-9);
        assert!((zipf.topk_expected_mass(1_000) - 1.0).abs() < 1e-9);
        assert!(zipf.topk_expected_mass(10) > 0.5);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ZipfWorkload::new(1.1, 0).is_err());
        assert!(ZipfWorkload::new(0.0, 10).is_err());
        assert!(ZipfWorkload::new(f64::NAN, 10).is_err());
    }
}
