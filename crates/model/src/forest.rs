//! Bagged regression trees.
//!
//! Each tree is a CART regressor grown on a bootstrap sample of the training
//! rows. Splits minimise the summed squared error of the two children and
//! consider every feature; thresholds sit midway between consecutive distinct
//! feature values. The forest predicts the mean of its trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Features, FEATURE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Nodes with fewer rows become leaves.
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(x: &[Features], y: &[f64], sample: Vec<usize>, params: &ForestParams) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((node, rows, depth)) = pending.pop() {
            let value = mean(y, &rows);

            let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
            if depth_exhausted || rows.len() < params.min_samples_split.max(2) || is_pure(y, &rows)
            {
                nodes[node] = Node::Leaf { value };
                continue;
            }

            let Some(split) = best_split(x, y, &rows) else {
                nodes[node] = Node::Leaf { value };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&i| x[i][split.feature] <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            pending.push((left, left_rows, depth + 1));
            pending.push((right, right_rows, depth + 1));
        }

        Self { nodes }
    }

    fn predict(&self, features: &Features) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

fn mean(y: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64
}

fn is_pure(y: &[f64], rows: &[usize]) -> bool {
    let first = y[rows[0]];
    rows.iter().all(|&i| y[i] == first)
}

/// Best variance-reducing split, or `None` when no split improves on the
/// parent (e.g. every feature is constant across `rows`).
fn best_split(x: &[Features], y: &[f64], rows: &[usize]) -> Option<SplitCandidate> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&i| y[i]).sum();
    // Maximising sum^2/n over both children minimises their squared error.
    let parent_score = total * total / n as f64;
    let tolerance = 1e-12 * parent_score.abs().max(1.0);

    let mut best: Option<SplitCandidate> = None;
    let mut order = rows.to_vec();

    for feature in 0..FEATURE_COUNT {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += y[order[k - 1]];

            let lo = x[order[k - 1]][feature];
            let hi = x[order[k]][feature];
            if lo == hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
            let beats_best = best.as_ref().map_or(true, |b| score > b.score);

            if score > parent_score + tolerance && beats_best {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit on rows `x` with targets `y`. Both must be non-empty and of equal
    /// length, and `params.n_estimators` must be at least one.
    pub fn fit(x: &[Features], y: &[f64], params: ForestParams) -> Self {
        debug_assert!(!x.is_empty() && x.len() == y.len());
        debug_assert!(params.n_estimators > 0);

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_estimators)
            .map(|t| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let sample: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                let tree = RegressionTree::fit(x, y, sample, &params);
                debug!(tree = t, leaves = tree.leaf_count(), "Fitted tree");
                tree
            })
            .collect();

        Self { params, trees }
    }

    pub fn predict(&self, features: &Features) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            ..ForestParams::default()
        }
    }

    fn step_data() -> (Vec<Features>, Vec<f64>) {
        let x: Vec<Features> = (0..40).map(|i| [4.0, -2.0, 25.0, i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 100.0 } else { 10.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_single_tree_learns_step() {
        let (x, y) = step_data();
        let rows: Vec<usize> = (0..x.len()).collect();
        let tree = RegressionTree::fit(&x, &y, rows, &params(1));

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&[4.0, -2.0, 25.0, 5.0]), 100.0);
        assert_eq!(tree.predict(&[4.0, -2.0, 25.0, 35.0]), 10.0);
        assert_eq!(tree.predict(&[4.0, -2.0, 25.0, 19.5]), 100.0);
    }

    #[test]
    fn test_split_threshold_is_midpoint() {
        let (x, y) = step_data();
        let rows: Vec<usize> = (0..x.len()).collect();
        let split = best_split(&x, &y, &rows).unwrap();
        assert_eq!(split.feature, 3);
        assert_eq!(split.threshold, 19.5);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let x: Vec<Features> = vec![[1.0, 1.0, 1.0, 1.0]; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let rows: Vec<usize> = (0..10).collect();

        assert!(best_split(&x, &y, &rows).is_none());
        let tree = RegressionTree::fit(&x, &y, rows, &params(1));
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&x[0]), 4.5);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x: Vec<Features> = (0..64).map(|i| [0.0, 0.0, 0.0, i as f64]).collect();
        let y: Vec<f64> = (0..64).map(|i| i as f64).collect();
        let rows: Vec<usize> = (0..64).collect();
        let shallow = ForestParams {
            max_depth: Some(2),
            ..params(1)
        };

        let tree = RegressionTree::fit(&x, &y, rows, &shallow);
        assert!(tree.leaf_count() <= 4);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = step_data();
        let a = RandomForest::fit(&x, &y, params(10));
        let b = RandomForest::fit(&x, &y, params(10));

        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn test_forest_prediction_within_target_range() {
        let x: Vec<Features> = (0..200)
            .map(|i| [4.2 - i as f64 * 0.001, -2.0, 24.0 + i as f64 * 0.01, i as f64])
            .collect();
        let y: Vec<f64> = (0..200).map(|i| 1500.0 - i as f64).collect();
        let forest = RandomForest::fit(&x, &y, params(20));

        for sample in [0.0, 50.0, 150.0, 199.0, 5000.0] {
            let p = forest.predict(&[4.0, -2.0, 25.0, sample]);
            assert!((1301.0..=1500.0).contains(&p), "prediction {p} out of range");
        }
        let mid = forest.predict(&x[100]);
        assert!((mid - 1400.0).abs() < 15.0);
    }
}
