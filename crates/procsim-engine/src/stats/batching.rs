//! # procsim-engine::stats::batching
//!
//! Hierarchical re-batching of a `Variable`'s flat sequence of initial batch
//! means into a final set of (approximately) independent batches, the
//! classic batch-means method for a single-replication steady-state
//! confidence interval. `Variable::roll_batch` already produces the initial
//! batches (settle current value to the boundary, contribute one
//! weighted-average observation); this module only does the re-batching and
//! final summarization on top of that flat sequence.

use crate::variable::Summary;

/// Parameters governing the re-batching. Defaults follow the usual
/// recommendation of starting from many small initial batches and merging
/// down until there are few enough, large enough, roughly independent ones.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlan {
    pub initial_batches: usize,
    pub min_num_batches: usize,
    pub min_batch_size: usize,
    pub max_multiple: usize,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self { initial_batches: 512, min_num_batches: 20, min_batch_size: 1, max_multiple: 4 }
    }
}

impl BatchPlan {
    /// The interval between batch boundaries: `(length - warmup) /
    /// initial_batches`, clamped at zero for a degenerate (zero-length or
    /// all-warm-up) replication.
    pub fn batch_interval(&self, replication_length: f64, warm_up_length: f64) -> f64 {
        ((replication_length - warm_up_length) / self.initial_batches as f64).max(0.0)
    }

    fn max_final_batches(&self) -> usize {
        self.min_num_batches * self.max_multiple
    }
}

/// Holds a flat sequence of initial batch means and merges them down to a
/// final set per a `BatchPlan`.
pub struct BatchSet {
    means: Vec<f64>,
}

impl BatchSet {
    pub fn new(means: Vec<f64>) -> Self {
        Self { means }
    }

    /// Repeatedly averages adjacent pairs (halving the count) until the
    /// count is within `plan`'s cap and each final batch represents at least
    /// `min_batch_size` initial batches, or until one batch is left. The
    /// result may still hold fewer than `min_num_batches` batches if too few
    /// initial batches were ever recorded -- re-batching can't manufacture
    /// observations that were never taken.
    pub fn finalize(mut self, plan: BatchPlan) -> Vec<f64> {
        let mut batch_size = 1usize;
        loop {
            let too_many = self.means.len() > plan.max_final_batches();
            let too_small = batch_size < plan.min_batch_size;
            if self.means.len() <= 1 || (!too_many && !too_small) {
                break;
            }
            self.means = halve(&self.means);
            batch_size *= 2;
        }
        self.means
    }
}

fn halve(means: &[f64]) -> Vec<f64> {
    means.chunks(2).map(|pair| pair.iter().sum::<f64>() / pair.len() as f64).collect()
}

/// Summarizes a final set of batch means as independent observations.
pub fn summarize(means: &[f64]) -> Summary {
    if means.is_empty() {
        return Summary { count: 0, mean: 0.0, std_dev: 0.0, min: 0.0, max: 0.0 };
    }
    let count = means.len() as u64;
    let mean = means.iter().sum::<f64>() / means.len() as f64;
    let variance = if means.len() > 1 {
        means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / (means.len() - 1) as f64
    } else {
        0.0
    };
    let min = means.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = means.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Summary { count, mean, std_dev: variance.sqrt(), min, max }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_until_within_cap() {
        let plan = BatchPlan { initial_batches: 512, min_num_batches: 4, min_batch_size: 1, max_multiple: 2 };
        let means: Vec<f64> = (0..64).map(|i| i as f64).collect();
        let final_means = BatchSet::new(means).finalize(plan);
        assert!(final_means.len() <= plan.min_num_batches * plan.max_multiple);
    }

    #[test]
    fn respects_min_batch_size() {
        let plan = BatchPlan { initial_batches: 512, min_num_batches: 1, min_batch_size: 4, max_multiple: 100 };
        let means: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let final_means = BatchSet::new(means).finalize(plan);
        // 16 initial batches merged in groups of >= 4 leaves at most 4 final batches.
        assert!(final_means.len() <= 4);
    }

    #[test]
    fn too_few_initial_batches_is_left_alone() {
        let plan = BatchPlan::default();
        let means = vec![1.0, 2.0, 3.0];
        let final_means = BatchSet::new(means.clone()).finalize(plan);
        assert_eq!(final_means, means);
    }

    #[test]
    fn summarize_matches_simple_mean() {
        let summary = summarize(&[2.0, 4.0, 6.0]);
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 4.0).abs() < 1e-9);
    }
}
