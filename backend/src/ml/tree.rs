//! Regression trees for gradient boosting

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One node in the flat tree layout. Internal nodes route on
/// `feature < threshold`; leaves carry the prediction in `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    pub value: f64,
    pub is_leaf: bool,
}

/// Binary regression tree stored as a flat node vector, root at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree to the residuals over the given rows, splitting on
    /// variance reduction. `columns` restricts the candidate features
    /// (column subsampling happens in the booster).
    pub fn fit(
        features: &Array2<f64>,
        targets: &Array1<f64>,
        rows: &[usize],
        columns: &[usize],
        max_depth: usize,
        min_samples_split: usize,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, rows, columns, max_depth, min_samples_split);
        tree
    }

    fn grow(
        &mut self,
        features: &Array2<f64>,
        targets: &Array1<f64>,
        rows: &[usize],
        columns: &[usize],
        depth_left: usize,
        min_samples_split: usize,
    ) -> usize {
        let mean = mean_of(targets, rows);

        if depth_left == 0 || rows.len() < min_samples_split {
            return self.push_leaf(mean);
        }

        let Some((feature, threshold)) = best_split(features, targets, rows, columns) else {
            return self.push_leaf(mean);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| features[[r, feature]] < threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push_leaf(mean);
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            feature,
            threshold,
            left: 0,
            right: 0,
            value: mean,
            is_leaf: false,
        });

        let left = self.grow(
            features,
            targets,
            &left_rows,
            columns,
            depth_left - 1,
            min_samples_split,
        );
        let right = self.grow(
            features,
            targets,
            &right_rows,
            columns,
            depth_left - 1,
            min_samples_split,
        );
        self.nodes[index].left = left;
        self.nodes[index].right = right;
        index
    }

    fn push_leaf(&mut self, value: f64) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
            is_leaf: true,
        });
        index
    }

    /// Predict one row by walking from the root
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            let node = &self.nodes[index];
            if node.is_leaf {
                return node.value;
            }
            index = if row[node.feature] < node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }
}

fn mean_of(targets: &Array1<f64>, rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64
}

/// Best (feature, threshold) over candidate columns by weighted variance
/// reduction. Thresholds are midpoints between adjacent sorted values.
fn best_split(
    features: &Array2<f64>,
    targets: &Array1<f64>,
    rows: &[usize],
    columns: &[usize],
) -> Option<(usize, f64)> {
    let parent_score = sum_sq_dev(targets, rows);
    let mut best: Option<(usize, f64)> = None;
    let mut best_gain = 1e-12;

    for &feature in columns {
        let mut sorted: Vec<usize> = rows.to_vec();
        sorted.sort_by(|&a, &b| {
            features[[a, feature]]
                .partial_cmp(&features[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_sum: f64 = sorted.iter().map(|&r| targets[r]).sum();
        let total_sq: f64 = sorted.iter().map(|&r| targets[r] * targets[r]).sum();
        let n = sorted.len() as f64;

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 0..sorted.len() - 1 {
            let y = targets[sorted[i]];
            left_sum += y;
            left_sq += y * y;

            let a = features[[sorted[i], feature]];
            let b = features[[sorted[i + 1], feature]];
            if a == b {
                continue;
            }

            let left_n = (i + 1) as f64;
            let right_n = n - left_n;
            let left_score = left_sq - left_sum * left_sum / left_n;
            let right_sum = total_sum - left_sum;
            let right_score = (total_sq - left_sq) - right_sum * right_sum / right_n;
            let gain = parent_score - left_score - right_score;

            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, (a + b) / 2.0));
            }
        }
    }

    best
}

fn sum_sq_dev(targets: &Array1<f64>, rows: &[usize]) -> f64 {
    let mean = mean_of(targets, rows);
    rows.iter().map(|&r| (targets[r] - mean).powi(2)).sum()
}
