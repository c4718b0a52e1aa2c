//! Balanced random forest over the weekly feature rows.
//!
//! Gini-split CART trees on class-balanced bootstrap samples: every tree
//! draws, with replacement, an equal number of rows from each class
//! present, so the majority label cannot drown out the others. Feature
//! subsampling uses sqrt of the feature count per split. The whole
//! ensemble is reproducible from one seed.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::features::FEATURE_NAMES;

/// Direction classes in index order.
pub const CLASSES: [i8; 3] = [-1, 0, 1];

/// Number of feature columns.
pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// Maps a label to its class index.
#[must_use]
pub fn class_index(label: i8) -> usize {
    match label {
        -1 => 0,
        0 => 1,
        _ => 2,
    }
}

/// Forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples to attempt a split.
    pub min_samples_split: usize,
    /// Seed for bootstrap and feature subsampling.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Overrides the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A tree node carrying its class distribution.
///
/// Split nodes keep their distribution too; the explainer reads the
/// change in class probability along the decision path.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf {
        distribution: [f64; 3],
    },
    Split {
        feature: usize,
        threshold: f64,
        distribution: [f64; 3],
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Class distribution stored at this node.
    #[must_use]
    pub fn distribution(&self) -> &[f64; 3] {
        match self {
            Node::Leaf { distribution } | Node::Split { distribution, .. } => distribution,
        }
    }
}

/// One CART tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Leaf distribution for a sample.
    #[must_use]
    pub fn predict_distribution(&self, x: &[f64; N_FEATURES]) -> [f64; 3] {
        *self.leaf(x).distribution()
    }

    /// Nodes visited from root to leaf for a sample.
    #[must_use]
    pub fn decision_path(&self, x: &[f64; N_FEATURES]) -> Vec<&Node> {
        let mut path = vec![&self.root];
        let mut node = &self.root;
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = node
        {
            node = if x[*feature] <= *threshold { left } else { right };
            path.push(node);
        }
        path
    }

    fn leaf(&self, x: &[f64; N_FEATURES]) -> &Node {
        let mut node = &self.root;
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = node
        {
            node = if x[*feature] <= *threshold { left } else { right };
        }
        node
    }
}

/// The class-balanced ensemble.
pub struct BalancedRandomForest {
    trees: Vec<DecisionTree>,
}

impl BalancedRandomForest {
    /// Fits the forest.
    ///
    /// # Errors
    /// Returns an error when the training set is empty or lengths differ.
    pub fn fit(
        x: &[[f64; N_FEATURES]],
        y: &[i8],
        config: &ForestConfig,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!x.is_empty(), "empty training set");
        anyhow::ensure!(x.len() == y.len(), "feature/label length mismatch");

        let labels: Vec<usize> = y.iter().map(|&l| class_index(l)).collect();
        let by_class: Vec<Vec<usize>> = (0..CLASSES.len())
            .map(|c| {
                (0..labels.len())
                    .filter(|&i| labels[i] == c)
                    .collect::<Vec<usize>>()
            })
            .collect();
        let smallest = by_class
            .iter()
            .filter(|members| !members.is_empty())
            .map(Vec::len)
            .min()
            .unwrap_or(0);

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        for _ in 0..config.n_trees {
            let sample = balanced_bootstrap(&by_class, smallest, &mut rng);
            let root = grow(x, &labels, &sample, 0, config, &mut rng);
            trees.push(DecisionTree { root });
        }
        Ok(Self { trees })
    }

    /// Mean class distribution across trees.
    #[must_use]
    pub fn predict_proba(&self, x: &[f64; N_FEATURES]) -> [f64; 3] {
        let mut proba = [0.0; 3];
        for tree in &self.trees {
            let dist = tree.predict_distribution(x);
            for (p, d) in proba.iter_mut().zip(dist.iter()) {
                *p += d;
            }
        }
        for p in &mut proba {
            *p /= self.trees.len() as f64;
        }
        proba
    }

    /// Predicted label. Ties resolve toward flat.
    #[must_use]
    pub fn predict(&self, x: &[f64; N_FEATURES]) -> i8 {
        let proba = self.predict_proba(x);

        // Check the flat class first so exact ties keep the neutral call.
        let order = [1usize, 0, 2];
        let mut best = order[0];
        for &c in &order[1..] {
            if proba[c] > proba[best] {
                best = c;
            }
        }
        CLASSES[best]
    }

    /// The fitted trees, for explanation.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

/// Draws `per_class` indices with replacement from every non-empty class.
fn balanced_bootstrap(
    by_class: &[Vec<usize>],
    per_class: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let mut sample = Vec::with_capacity(per_class * by_class.len());
    for members in by_class {
        if members.is_empty() {
            continue;
        }
        for _ in 0..per_class {
            sample.push(members[rng.gen_range(0..members.len())]);
        }
    }
    sample
}

fn distribution_of(labels: &[usize], indices: &[usize]) -> [f64; 3] {
    let mut counts = [0.0; 3];
    for &i in indices {
        counts[labels[i]] += 1.0;
    }
    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        for c in &mut counts {
            *c /= total;
        }
    }
    counts
}

fn gini(distribution: &[f64; 3]) -> f64 {
    1.0 - distribution.iter().map(|p| p * p).sum::<f64>()
}

fn grow(
    x: &[[f64; N_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    depth: usize,
    config: &ForestConfig,
    rng: &mut ChaCha8Rng,
) -> Node {
    let distribution = distribution_of(labels, indices);

    let pure = distribution.iter().any(|p| (*p - 1.0).abs() < f64::EPSILON);
    if depth >= config.max_depth || indices.len() < config.min_samples_split || pure {
        return Node::Leaf { distribution };
    }

    let Some((feature, threshold)) = best_split(x, labels, indices, rng) else {
        return Node::Leaf { distribution };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        return Node::Leaf { distribution };
    }

    let left = grow(x, labels, &left_idx, depth + 1, config, rng);
    let right = grow(x, labels, &right_idx, depth + 1, config, rng);
    Node::Split {
        feature,
        threshold,
        distribution,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Best gini split over a sqrt-sized random feature subset.
fn best_split(
    x: &[[f64; N_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<(usize, f64)> {
    let n_candidates = (N_FEATURES as f64).sqrt().round() as usize;
    let mut features: Vec<usize> = (0..N_FEATURES).collect();
    features.shuffle(rng);
    features.truncate(n_candidates.max(1));

    let parent_impurity = gini(&distribution_of(labels, indices));
    let total = indices.len() as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    for &feature in &features {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let weighted = (left.len() as f64 / total) * gini(&distribution_of(labels, &left))
                + (right.len() as f64 / total) * gini(&distribution_of(labels, &right));
            let decrease = parent_impurity - weighted;

            let improves = best.map_or(decrease > 1e-12, |(_, _, d)| decrease > d);
            if improves {
                best = Some((feature, threshold, decrease));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic set where feature 0 fully decides the class.
    fn separable(n_per_class: usize) -> (Vec<[f64; N_FEATURES]>, Vec<i8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..n_per_class {
            let jitter = i as f64 * 0.01;

            let mut down = [0.0; N_FEATURES];
            down[0] = -2.0 - jitter;
            x.push(down);
            y.push(-1);

            let mut flat = [0.0; N_FEATURES];
            flat[0] = 0.0 + jitter;
            x.push(flat);
            y.push(0);

            let mut up = [0.0; N_FEATURES];
            up[0] = 2.0 + jitter;
            x.push(up);
            y.push(1);
        }
        (x, y)
    }

    fn probe(value: f64) -> [f64; N_FEATURES] {
        let mut x = [0.0; N_FEATURES];
        x[0] = value;
        x
    }

    #[test]
    fn fit_rejects_empty_training_set() {
        let result = BalancedRandomForest::fit(&[], &[], &ForestConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn fit_rejects_length_mismatch() {
        let x = vec![[0.0; N_FEATURES]];
        let result = BalancedRandomForest::fit(&x, &[1, 0], &ForestConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn separable_classes_are_recovered() {
        let (x, y) = separable(20);
        let config = ForestConfig {
            n_trees: 25,
            ..ForestConfig::default()
        };
        let forest = BalancedRandomForest::fit(&x, &y, &config).unwrap();

        assert_eq!(forest.predict(&probe(-2.5)), -1);
        assert_eq!(forest.predict(&probe(0.05)), 0);
        assert_eq!(forest.predict(&probe(2.5)), 1);
    }

    #[test]
    fn proba_sums_to_one() {
        let (x, y) = separable(10);
        let forest = BalancedRandomForest::fit(&x, &y, &ForestConfig::default()).unwrap();

        let proba = forest.predict_proba(&probe(1.5));
        let total: f64 = proba.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
    }

    #[test]
    fn fixed_seed_reproduces_predictions() {
        let (x, y) = separable(15);
        let config = ForestConfig::default().with_seed(7);

        let a = BalancedRandomForest::fit(&x, &y, &config).unwrap();
        let b = BalancedRandomForest::fit(&x, &y, &config).unwrap();

        for value in [-3.0, -1.0, 0.0, 1.0, 3.0] {
            assert_eq!(a.predict_proba(&probe(value)), b.predict_proba(&probe(value)));
        }
    }

    #[test]
    fn minority_class_survives_imbalance() {
        // 60 flat rows against 8 up rows: the balanced bootstrap keeps
        // the up region winnable.
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let mut row = [0.0; N_FEATURES];
            row[0] = -1.0 - (i as f64) * 0.01;
            x.push(row);
            y.push(0);
        }
        for i in 0..8 {
            let mut row = [0.0; N_FEATURES];
            row[0] = 3.0 + (i as f64) * 0.01;
            x.push(row);
            y.push(1);
        }

        let forest = BalancedRandomForest::fit(&x, &y, &ForestConfig::default()).unwrap();
        assert_eq!(forest.predict(&probe(3.5)), 1);
    }

    #[test]
    fn single_class_training_yields_that_class() {
        let x = vec![probe(1.0), probe(2.0), probe(3.0)];
        let y = vec![1, 1, 1];
        let forest = BalancedRandomForest::fit(&x, &y, &ForestConfig::default()).unwrap();

        assert_eq!(forest.predict(&probe(-5.0)), 1);
    }

    #[test]
    fn class_index_mapping() {
        assert_eq!(class_index(-1), 0);
        assert_eq!(class_index(0), 1);
        assert_eq!(class_index(1), 2);
        assert_eq!(CLASSES[class_index(-1)], -1);
    }
}
