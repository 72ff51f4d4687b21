//! Bagged regression trees.
//!
//! Each tree is grown on a bootstrap sample of the training rows, considers
//! every feature at each node, and splits where the summed squared error of
//! the two children is smallest. Thresholds sit halfway between adjacent
//! distinct feature values. A forest prediction is the mean of its trees.

use crate::config::ForestConfig;
use crate::error::{PriceEngineError, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
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
    /// Number of rows (in sorted order) that go to the left child.
    position: usize,
    score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grows a tree on the rows named by `indices`. Repeated indices act as
    /// sample weights, which is how bootstrap samples are fed in.
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &mut [usize],
        config: &ForestConfig,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, indices, 0, config);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
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

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        walk(&self.nodes, 0)
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &mut [usize],
        depth: usize,
        config: &ForestConfig,
    ) -> usize {
        let id = self.nodes.len();
        let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;
        self.nodes.push(Node::Leaf { value: mean });

        let depth_exhausted = config.max_depth.is_some_and(|max| depth >= max);
        let first = targets[indices[0]];
        let pure = indices.iter().all(|&i| targets[i] == first);

        if depth_exhausted || pure || indices.len() < config.min_samples_split {
            return id;
        }

        let Some(split) = best_split(features, targets, indices, config.min_samples_leaf) else {
            return id;
        };

        let feature = split.feature;
        indices.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));
        let (left_rows, right_rows) = indices.split_at_mut(split.position);

        let left = self.grow(features, targets, left_rows, depth + 1, config);
        let right = self.grow(features, targets, right_rows, depth + 1, config);

        self.nodes[id] = Node::Split {
            feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let n_features = features[indices[0]].len();
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();

    // Minimizing child SSE is the same as maximizing sum_l^2/n_l + sum_r^2/n_r
    let parent_score = total * total / n as f64;
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += targets[sorted[k]];

            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_samples_leaf || right_n < min_samples_leaf {
                continue;
            }

            let here = features[sorted[k]][feature];
            let next = features[sorted[k + 1]][feature];
            if here == next {
                continue;
            }

            let right_sum = total - left_sum;
            let score =
                left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

            let improves = score > parent_score + 1e-9;
            if improves && best.as_ref().map_or(true, |b| score > b.score) {
                let mut threshold = (here + next) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    position: left_n,
                    score,
                });
            }
        }
    }

    best
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if features.is_empty() {
            return Err(PriceEngineError::Model(
                "cannot fit on an empty training set".to_string(),
            ));
        }

        if features.len() != targets.len() {
            return Err(PriceEngineError::Model(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        let n_features = features[0].len();
        if n_features == 0 || features.iter().any(|row| row.len() != n_features) {
            return Err(PriceEngineError::Model(
                "feature rows must share the same non-zero width".to_string(),
            ));
        }

        if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(PriceEngineError::Model(
                "training data contains non-finite values".to_string(),
            ));
        }

        if self.config.n_trees == 0 {
            return Err(PriceEngineError::Model(
                "forest needs at least one tree".to_string(),
            ));
        }

        let n = features.len();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sample = vec![0usize; n];

        self.trees = (0..self.config.n_trees)
            .map(|_| {
                for slot in sample.iter_mut() {
                    *slot = rng.gen_range(0..n);
                }
                RegressionTree::fit(features, targets, &mut sample, &self.config)
            })
            .collect();
        self.n_features = n_features;

        debug!(
            "Fitted {} trees on {} rows x {} features",
            self.trees.len(),
            n,
            n_features
        );

        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<f64> {
        if !self.is_fitted() {
            return Err(PriceEngineError::Model(
                "predict called before fit".to_string(),
            ));
        }

        if row.len() != self.n_features {
            return Err(PriceEngineError::Model(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }
}
