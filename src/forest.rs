//! Random-forest classifier over CART decision trees.
//!
//! Trees split on Gini impurity with midpoint thresholds between adjacent
//! unique feature values. The forest trains each tree on a seeded bootstrap
//! sample (tree `i` uses `seed + i`), so a fixed seed and fixed input
//! reproduce the exact same forest. Prediction is majority vote; the
//! probability distribution is the vote proportion per class, which sums to
//! 1.0 exactly. Inference is fully deterministic.

use ndarray::Array2;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Clone, Debug, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: usize,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single fitted CART classification tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
    n_features: usize,
}

impl DecisionTree {
    /// Fit a tree on the full sample set.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] on empty data or a row /
    /// label count mismatch.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        max_depth: Option<usize>,
    ) -> Result<Self, PipelineError> {
        let (rows, cols) = x.dim();
        if rows == 0 {
            return Err(PipelineError::InvalidDataset(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        if rows != y.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "sample count mismatch: {} rows vs {} labels",
                rows,
                y.len()
            )));
        }
        let indices: Vec<usize> = (0..rows).collect();
        Ok(Self {
            root: build_node(x, y, &indices, 0, max_depth),
            n_features: cols,
        })
    }

    /// Number of features the tree was trained on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predict the class of a single sample.
    ///
    /// # Errors
    /// [`PipelineError::SchemaMismatch`] on a vector length mismatch.
    pub fn predict_one(&self, x: &[f64]) -> Result<usize, PipelineError> {
        if x.len() != self.n_features {
            return Err(PipelineError::SchemaMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { class, .. } => return Ok(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Gini impurity of a label subset: `1 - Σ p_i²`.
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn class_counts(y: &[usize], indices: &[usize]) -> Vec<usize> {
    let n_classes = indices.iter().map(|&i| y[i]).max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

/// Majority class; ties break toward the lowest code for determinism.
fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    let mut best_count = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best = class;
            best_count = count;
        }
    }
    best
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

fn build_node(
    x: &Array2<f64>,
    y: &[usize],
    indices: &[usize],
    depth: usize,
    max_depth: Option<usize>,
) -> TreeNode {
    let counts = class_counts(y, indices);
    let impurity = gini(&counts, indices.len());

    let depth_reached = max_depth.is_some_and(|d| depth >= d);
    if impurity == 0.0 || depth_reached || indices.len() < 2 {
        return TreeNode::Leaf {
            class: majority_class(&counts),
            n_samples: indices.len(),
        };
    }

    match find_best_split(x, y, indices, impurity) {
        Some(split) => TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(build_node(x, y, &split.left, depth + 1, max_depth)),
            right: Box::new(build_node(x, y, &split.right, depth + 1, max_depth)),
        },
        None => TreeNode::Leaf {
            class: majority_class(&counts),
            n_samples: indices.len(),
        },
    }
}

/// Best Gini-gain split over all features, trying each midpoint between
/// adjacent unique values as a threshold.
fn find_best_split(
    x: &Array2<f64>,
    y: &[usize],
    indices: &[usize],
    parent_impurity: f64,
) -> Option<BestSplit> {
    let n_features = x.dim().1;
    let n_total = indices.len() as f64;
    let mut best: Option<(f64, usize, f64)> = None; // (gain, feature, threshold)

    for feature in 0..n_features {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let left: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| x[[i, feature]] <= threshold)
                .collect();
            if left.is_empty() || left.len() == indices.len() {
                continue;
            }
            let right: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| x[[i, feature]] > threshold)
                .collect();

            let left_counts = class_counts(y, &left);
            let right_counts = class_counts(y, &right);
            let weighted = (left.len() as f64 / n_total) * gini(&left_counts, left.len())
                + (right.len() as f64 / n_total) * gini(&right_counts, right.len());
            let gain = parent_impurity - weighted;

            if gain > 0.0 && best.map_or(true, |(g, _, _)| gain > g) {
                best = Some((gain, feature, threshold));
            }
        }
    }

    best.map(|(_, feature, threshold)| {
        let left: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| x[[i, feature]] <= threshold)
            .collect();
        let right: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| x[[i, feature]] > threshold)
            .collect();
        BestSplit {
            feature,
            threshold,
            left,
            right,
        }
    })
}

/// Unfitted random-forest classifier configuration.
///
/// # Example
/// ```
/// use ndarray::array;
/// use loan_approval::forest::RandomForestClassifier;
///
/// let x = array![[0.0], [0.1], [1.0], [1.1]];
/// let y = vec![0, 0, 1, 1];
/// let forest = RandomForestClassifier::new(25)
///     .with_seed(42)
///     .fit(&x, &y, 2)
///     .unwrap();
/// let (class, proba) = forest.predict(&[1.05]).unwrap();
/// assert_eq!(class, 1);
/// assert!(proba[1] > 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    max_depth: Option<usize>,
    seed: u64,
}

impl RandomForestClassifier {
    /// Create a forest configuration with `n_estimators` trees.
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            seed: 42,
        }
    }

    /// Limit the depth of each tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Set the bootstrap sampling seed. Identical seed and data reproduce
    /// an identical forest.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest on training data with labels in `0..n_classes`.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] on empty data, a row /
    /// label mismatch, or a label outside `0..n_classes`.
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<FittedRandomForest, PipelineError> {
        let (rows, cols) = x.dim();
        if rows == 0 || self.n_estimators == 0 {
            return Err(PipelineError::InvalidDataset(
                "cannot fit a forest on zero samples or zero trees".to_string(),
            ));
        }
        if rows != y.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "sample count mismatch: {} rows vs {} labels",
                rows,
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(PipelineError::InvalidDataset(format!(
                "label {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let dist = Uniform::from(0..rows);
        let mut trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
            let mut bootstrap_x = Array2::<f64>::zeros((rows, cols));
            let mut bootstrap_y = Vec::with_capacity(rows);
            for row in 0..rows {
                let src = dist.sample(&mut rng);
                for col in 0..cols {
                    bootstrap_x[[row, col]] = x[[src, col]];
                }
                bootstrap_y.push(y[src]);
            }
            trees.push(DecisionTree::fit(&bootstrap_x, &bootstrap_y, self.max_depth)?);
        }

        Ok(FittedRandomForest {
            trees,
            n_classes,
            n_features: cols,
        })
    }
}

/// Fitted random forest ready for inference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FittedRandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl FittedRandomForest {
    /// Number of trees in the forest.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of target classes.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of input features.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predict the class code and the per-class probability distribution
    /// for one scaled feature vector.
    ///
    /// The distribution is the vote proportion per class across trees,
    /// dense and indexed by class code; it sums to 1.0. The predicted class
    /// is the argmax, ties breaking toward the lowest code.
    ///
    /// # Errors
    /// [`PipelineError::SchemaMismatch`] on a vector length mismatch.
    pub fn predict(&self, x: &[f64]) -> Result<(usize, Vec<f64>), PipelineError> {
        let proba = self.predict_proba(x)?;
        let mut class = 0;
        let mut best = f64::MIN;
        for (code, &p) in proba.iter().enumerate() {
            if p > best {
                class = code;
                best = p;
            }
        }
        Ok((class, proba))
    }

    /// Per-class vote proportions for one scaled feature vector.
    ///
    /// # Errors
    /// [`PipelineError::SchemaMismatch`] on a vector length mismatch.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if x.len() != self.n_features {
            return Err(PipelineError::SchemaMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict_one(x)?;
            if class < self.n_classes {
                votes[class] += 1;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }
}
