//! Gradient-Boosted Regression Trees
//!
//! Squared-error boosting over depth-limited trees with exact greedy splits.
//! Each tree is fit to the current residuals on a seeded row subsample, so a
//! given dataset and parameter set always produce the same model.
//!
//! Prediction: `base_score + learning_rate * sum(tree outputs)`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows sampled (without replacement) per tree
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_trees: 120,
            learning_rate: 0.1,
            max_depth: 4,
            min_samples_leaf: 5,
            subsample: 0.8,
            seed: 42,
        }
    }
}

/// Minimum gain for a split to be kept
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat pre-order node list (root at 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural check for a deserialized tree. Children must come after
    /// their parent, which also rules out cycles.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("node {i}: non-finite leaf value"));
                }
                Node::Leaf { .. } => {}
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {i}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i}: invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tree builder over a fixed design matrix
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    residuals: &'a [f64],
    params: &'a BoostingParams,
    nodes: Vec<Node>,
    gains: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, rows: Vec<usize>) -> (RegressionTree, Vec<f64>) {
        self.grow(rows, 0);
        (RegressionTree { nodes: self.nodes }, self.gains)
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let idx = self.nodes.len();
        let sum: f64 = rows.iter().map(|&r| self.residuals[r]).sum();
        #[allow(clippy::cast_precision_loss)]
        let leaf_value = if rows.is_empty() { 0.0 } else { sum / rows.len() as f64 };
        self.nodes.push(Node::Leaf { value: leaf_value });

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf.max(1) {
            return idx;
        }
        let Some(split) = self.best_split(&rows, sum) else {
            return idx;
        };

        self.gains[split.feature] += split.gain;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[r][split.feature] <= split.threshold);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    /// Exact greedy search. Ties keep the first candidate found
    /// (lowest feature index, then lowest threshold).
    fn best_split(&self, rows: &[usize], total: f64) -> Option<SplitCandidate> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let min_leaf = self.params.min_samples_leaf.max(1);
        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        let parent_score = total * total / n;
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..n_features {
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]).then(a.cmp(&b)));
            let mut left_sum = 0.0;
            for i in 0..sorted.len() - 1 {
                left_sum += self.residuals[sorted[i]];
                let left_n = i + 1;
                let right_n = sorted.len() - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let here = self.x[sorted[i]][feature];
                let next = self.x[sorted[i + 1]][feature];
                if here == next {
                    continue;
                }
                let right_sum = total - left_sum;
                #[allow(clippy::cast_precision_loss)]
                let gain = left_sum * left_sum / left_n as f64
                    + right_sum * right_sum / right_n as f64
                    - parent_score;
                if gain > MIN_SPLIT_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Trained boosted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedModel {
    base_score: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
    /// Split gain per feature, normalised to sum to 1 (all zero if no splits)
    importances: Vec<f64>,
}

impl GradientBoostedModel {
    /// Fit on rows `x` (all of equal width) against targets `y`.
    ///
    /// An empty dataset yields a constant-zero model; callers check row
    /// counts before training.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &BoostingParams) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let n_rows = x.len().min(y.len());
        let base_score = if n_rows == 0 { 0.0 } else { y[..n_rows].iter().mean() };

        let mut predictions = vec![base_score; n_rows];
        let mut residuals = vec![0.0; n_rows];
        let mut gains = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut all_rows: Vec<usize> = (0..n_rows).collect();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let sample_size = ((params.subsample.clamp(0.0, 1.0) * n_rows as f64).ceil() as usize)
            .clamp(n_rows.min(1), n_rows);

        for _ in 0..params.n_trees {
            if n_rows == 0 {
                break;
            }
            for i in 0..n_rows {
                residuals[i] = y[i] - predictions[i];
            }
            all_rows.shuffle(&mut rng);
            let mut sample = all_rows[..sample_size].to_vec();
            sample.sort_unstable();

            let builder = TreeBuilder {
                x,
                residuals: &residuals,
                params,
                nodes: Vec::new(),
                gains: vec![0.0; n_features],
            };
            let (tree, tree_gains) = builder.build(sample);
            for (total, g) in gains.iter_mut().zip(tree_gains) {
                *total += g;
            }
            for (i, p) in predictions.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict(&x[i]);
            }
            trees.push(tree);
        }

        let total_gain: f64 = gains.iter().sum();
        let importances = if total_gain > 0.0 {
            gains.iter().map(|g| g / total_gain).collect()
        } else {
            vec![0.0; n_features]
        };

        Self {
            base_score,
            learning_rate: params.learning_rate,
            n_features,
            trees,
            importances,
        }
    }

    /// Predict one row; `row.len()` must equal `n_features()`
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base_score
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Check a deserialized model before use
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err("non-finite base score or learning rate".to_string());
        }
        if self.importances.len() != self.n_features {
            return Err(format!(
                "importance vector has {} entries, expected {}",
                self.importances.len(),
                self.n_features
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}
