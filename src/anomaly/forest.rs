use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AnomalyConfig;
use crate::ledger::types::AnomalyLabel;

/// Number of numeric features per sample: (amount, fee).
pub const FEATURES: usize = 2;

pub type Sample = [f64; FEATURES];

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Unsupervised outlier model that is fit on a batch and labels that same batch.
pub trait OutlierDetector {
    /// Called with at least one sample. Output order matches input order.
    fn fit_predict(&self, samples: &[Sample]) -> Vec<AnomalyLabel>;
}

/// Isolation forest over a fixed feature pair.
///
/// Every call grows a new forest from `seed`, so the same batch always gets
/// the same labels, while labels for a given row still depend on the rest of
/// the batch.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl IsolationForest {
    pub fn new(n_trees: usize, max_samples: usize, contamination: f64, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            max_samples: max_samples.max(1),
            contamination,
            seed,
        }
    }

    pub fn from_config(config: &AnomalyConfig) -> Self {
        Self::new(
            config.n_trees,
            config.max_samples,
            config.contamination,
            config.seed,
        )
    }

    /// Anomaly score `2^(-E[h(x)] / c(psi))` per sample. Higher means more isolated.
    pub fn score_samples(&self, samples: &[Sample]) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }

        let sample_size = self.max_samples.min(samples.len());
        let normalizer = average_path_length(sample_size);
        if normalizer == 0.0 {
            return vec![0.5; samples.len()];
        }

        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let trees: Vec<Node> = (0..self.n_trees)
            .map(|_| {
                let subsample: Vec<Sample> =
                    rand::seq::index::sample(&mut rng, samples.len(), sample_size)
                        .into_iter()
                        .map(|i| samples[i])
                        .collect();
                grow(&mut rng, subsample, 0, height_limit)
            })
            .collect();

        samples
            .iter()
            .map(|x| {
                let mean_depth = trees.iter().map(|t| path_length(t, x, 0)).sum::<f64>()
                    / trees.len() as f64;
                2f64.powf(-mean_depth / normalizer)
            })
            .collect()
    }
}

impl OutlierDetector for IsolationForest {
    fn fit_predict(&self, samples: &[Sample]) -> Vec<AnomalyLabel> {
        let normality: Vec<f64> = self.score_samples(samples).into_iter().map(|s| -s).collect();
        let offset = percentile(&normality, self.contamination * 100.0);
        normality
            .into_iter()
            .map(|s| {
                if s < offset {
                    AnomalyLabel::Anomalous
                } else {
                    AnomalyLabel::Normal
                }
            })
            .collect()
    }
}

fn grow<R: Rng + ?Sized>(rng: &mut R, points: Vec<Sample>, depth: usize, height_limit: usize) -> Node {
    if depth >= height_limit || points.len() <= 1 {
        return Node::Leaf { size: points.len() };
    }

    // Only features that still vary can split this node.
    let candidates: Vec<(usize, f64, f64)> = (0..FEATURES)
        .filter_map(|f| {
            let (min, max) = points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p[f]), hi.max(p[f]))
                });
            (max > min).then_some((f, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: points.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<Sample>, Vec<Sample>) =
        points.into_iter().partition(|p| p[feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(rng, left, depth + 1, height_limit)),
        right: Box::new(grow(rng, right, depth + 1, height_limit)),
    }
}

fn path_length(node: &Node, x: &Sample, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if x[*feature] <= *threshold {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
