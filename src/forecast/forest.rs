//! Bootstrap-aggregated regression trees.
//!
//! Each tree is a CART regressor grown to purity on a bootstrap resample of
//! the training rows, considering every feature at every split. The forest
//! prediction is the mean of the tree predictions. All randomness comes from
//! a seeded SplitMix64 stream, so a given seed always yields the same forest.

use crate::error::{AnalysisError, AnalysisResult};

const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) seed: u64,
}

#[derive(Debug)]
pub(crate) struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub(crate) fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        config: ForestConfig,
    ) -> AnalysisResult<Self> {
        validate_training_set(features, targets)?;
        if config.n_trees == 0 {
            return Err(AnalysisError::Computation(
                "random forest needs at least one tree".into(),
            ));
        }

        let n = features.len();
        let mut rng = SplitMix64::new(config.seed);
        let trees = (0..config.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.below(n)).collect();
                RegressionTree::fit(features, targets, sample)
            })
            .collect();
        Ok(Self { trees })
    }

    pub(crate) fn predict(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }
}

fn validate_training_set(features: &[Vec<f64>], targets: &[f64]) -> AnalysisResult<()> {
    if features.is_empty() {
        return Err(AnalysisError::Computation("no training rows".into()));
    }
    if features.len() != targets.len() {
        return Err(AnalysisError::Computation(format!(
            "{} feature rows but {} targets",
            features.len(),
            targets.len()
        )));
    }
    let width = features[0].len();
    if width == 0 || features.iter().any(|row| row.len() != width) {
        return Err(AnalysisError::Computation(
            "feature rows must be non-empty and equally sized".into(),
        ));
    }
    let all_finite = features.iter().flatten().chain(targets).all(|v| v.is_finite());
    if !all_finite {
        return Err(AnalysisError::Computation(
            "training data contains non-finite values".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug)]
struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    fn fit(features: &[Vec<f64>], targets: &[f64], sample: Vec<usize>) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, sample);
        tree
    }

    fn grow(&mut self, features: &[Vec<f64>], targets: &[f64], indices: Vec<usize>) -> usize {
        let id = self.nodes.len();
        let value = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;
        self.nodes.push(Node::Leaf(value));

        if indices.len() < MIN_SAMPLES_SPLIT {
            return id;
        }
        let Some(split) = best_split(features, targets, &indices) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| features[i][split.feature] <= split.threshold);
        let left = self.grow(features, targets, left_idx);
        let right = self.grow(features, targets, right_idx);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Lowest total squared error split over all features, or `None` when the
/// node is already pure or no feature separates its rows.
fn best_split(features: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Option<SplitCandidate> {
    let n = indices.len();
    let parent_sse = sse(indices.iter().map(|&i| targets[i]));
    if parent_sse <= f64::EPSILON {
        return None;
    }

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();
    for feature in 0..features[indices[0]].len() {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let total_sum: f64 = sorted.iter().map(|&i| targets[i]).sum();
        let total_sq: f64 = sorted.iter().map(|&i| targets[i] * targets[i]).sum();
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..n {
            let y = targets[sorted[k - 1]];
            left_sum += y;
            left_sq += y * y;

            let lo = features[sorted[k - 1]][feature];
            let hi = features[sorted[k]][feature];
            if lo == hi {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let split_sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| split_sse < b.sse) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    sse: split_sse,
                });
            }
        }
    }
    best
}

fn sse(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (n, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    values.map(|v| (v - mean).powi(2)).sum()
}

/// SplitMix64 generator; small, fast, and fully determined by its seed.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform-ish index in `0..n`. Modulo bias is irrelevant at these sizes.
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}
