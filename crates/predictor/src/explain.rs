//! Per-prediction feature attribution.
//!
//! Tree-path (SHAP-style) contributions: walking a sample from root to
//! leaf, each split transfers the change in predicted-class probability
//! to the feature it tested. Contributions are averaged across the
//! ensemble, so they sum to the leaf probability minus the root prior.

use serde::Serialize;

use crate::features::FEATURE_NAMES;
use crate::forest::{BalancedRandomForest, Node, N_FEATURES};

/// A signed attribution for one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
    /// 1-based rank by absolute value.
    pub rank: usize,
}

/// Signed contribution of every feature toward `class_idx` for `x`.
#[must_use]
pub fn feature_contributions(
    forest: &BalancedRandomForest,
    x: &[f64; N_FEATURES],
    class_idx: usize,
) -> [f64; N_FEATURES] {
    let mut totals = [0.0; N_FEATURES];

    for tree in forest.trees() {
        let path = tree.decision_path(x);
        for pair in path.windows(2) {
            let Node::Split { feature, .. } = pair[0] else {
                continue;
            };
            let delta =
                pair[1].distribution()[class_idx] - pair[0].distribution()[class_idx];
            totals[*feature] += delta;
        }
    }

    let n = forest.trees().len() as f64;
    for total in &mut totals {
        *total /= n;
    }
    totals
}

/// The `n` strongest contributions by absolute value, ranked from 1.
#[must_use]
pub fn top_contributions(contributions: &[f64; N_FEATURES], n: usize) -> Vec<FeatureContribution> {
    let mut indexed: Vec<(usize, f64)> = contributions
        .iter()
        .copied()
        .enumerate()
        .collect();
    indexed.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    indexed
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(rank, (feature, value))| FeatureContribution {
            feature: FEATURE_NAMES[feature].to_string(),
            value,
            rank: rank + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{class_index, ForestConfig};

    fn probe(value: f64) -> [f64; N_FEATURES] {
        let mut x = [0.0; N_FEATURES];
        x[0] = value;
        x
    }

    fn fitted() -> BalancedRandomForest {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = i as f64 * 0.01;
            x.push(probe(-2.0 - jitter));
            y.push(-1);
            x.push(probe(2.0 + jitter));
            y.push(1);
        }
        BalancedRandomForest::fit(&x, &y, &ForestConfig::default()).unwrap()
    }

    #[test]
    fn contributions_sum_to_leaf_minus_prior() {
        let forest = fitted();
        let sample = probe(2.5);
        let class = class_index(1);

        let contributions = feature_contributions(&forest, &sample, class);
        let total: f64 = contributions.iter().sum();

        let leaf = forest.predict_proba(&sample)[class];
        let prior: f64 = forest
            .trees()
            .iter()
            .map(|t| t.decision_path(&sample)[0].distribution()[class])
            .sum::<f64>()
            / forest.trees().len() as f64;

        assert!((total - (leaf - prior)).abs() < 1e-9);
    }

    #[test]
    fn deciding_feature_dominates() {
        let forest = fitted();
        let contributions = feature_contributions(&forest, &probe(2.5), class_index(1));

        let strongest = top_contributions(&contributions, 1);
        assert_eq!(strongest[0].feature, "SMA_5");
        assert!(strongest[0].value > 0.0);
    }

    #[test]
    fn opposing_class_gets_negative_contribution() {
        let forest = fitted();
        let contributions = feature_contributions(&forest, &probe(2.5), class_index(-1));
        assert!(contributions[0] < 0.0);
    }

    #[test]
    fn top_contributions_rank_by_magnitude() {
        let mut contributions = [0.0; N_FEATURES];
        contributions[2] = -0.5;
        contributions[4] = 0.3;
        contributions[7] = 0.1;

        let top = top_contributions(&contributions, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].feature, "SMA_diff");
        assert_eq!(top[0].rank, 1);
        assert!((top[0].value + 0.5).abs() < 1e-12);
        assert_eq!(top[1].feature, "Momentum_10");
        assert_eq!(top[2].feature, "price_to_trough");
        assert_eq!(top[2].rank, 3);
    }
}
