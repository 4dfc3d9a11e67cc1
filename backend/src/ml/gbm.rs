//! Gradient boosting over regression trees

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::ml::tree::RegressionTree;

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of columns sampled per tree
    pub colsample: f64,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for GbmConfig {
    fn default() -> Self {
        Self {
            n_trees: 150,
            max_depth: 8,
            learning_rate: 0.05,
            subsample: 0.8,
            colsample: 0.8,
            min_samples_split: 3,
            seed: 42,
        }
    }
}

/// Gradient-boosted regressor with squared-error loss.
///
/// The model is the mean of the training targets plus a shrunken sum of
/// trees fitted to successive residuals. Serializes to JSON for the model
/// artifact store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    pub init: f64,
    pub trees: Vec<RegressionTree>,
    pub config: GbmConfig,
}

impl GradientBoostedRegressor {
    /// Train on a dense feature matrix and target vector.
    pub fn fit(features: &Array2<f64>, targets: &Array1<f64>, config: GbmConfig) -> AppResult<Self> {
        let n_rows = features.nrows();
        let n_cols = features.ncols();
        if n_rows == 0 || n_rows != targets.len() {
            return Err(AppError::Training(format!(
                "feature matrix ({} rows) and targets ({}) do not align",
                n_rows,
                targets.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let init = targets.sum() / n_rows as f64;
        let mut predictions = Array1::from_elem(n_rows, init);
        let mut trees = Vec::with_capacity(config.n_trees);

        let row_sample = ((n_rows as f64 * config.subsample).round() as usize).max(1);
        let col_sample = ((n_cols as f64 * config.colsample).round() as usize).max(1);
        let all_rows: Vec<usize> = (0..n_rows).collect();
        let all_cols: Vec<usize> = (0..n_cols).collect();

        for _ in 0..config.n_trees {
            let residuals = targets - &predictions;

            let mut rows = all_rows.clone();
            rows.shuffle(&mut rng);
            rows.truncate(row_sample);

            let mut columns = all_cols.clone();
            columns.shuffle(&mut rng);
            columns.truncate(col_sample);

            let tree = RegressionTree::fit(
                features,
                &residuals,
                &rows,
                &columns,
                config.max_depth,
                config.min_samples_split,
            );

            for row in 0..n_rows {
                let x: Vec<f64> = features.row(row).to_vec();
                predictions[row] += config.learning_rate * tree.predict_row(&x);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            trees,
            config,
        })
    }

    /// Predict one feature row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.config.learning_rate * t.predict_row(row))
                .sum::<f64>()
    }

    /// Predict every row of a feature matrix
    pub fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
        Array1::from_iter(
            features
                .rows()
                .into_iter()
                .map(|row| self.predict_row(&row.to_vec())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let features =
            Array2::from_shape_fn((80, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let targets = Array1::from_shape_fn(80, |i| 3.0 * i as f64 + (i % 7) as f64);
        (features, targets)
    }

    #[test]
    fn fits_a_linear_relation() {
        let (features, targets) = linear_data();
        let config = GbmConfig {
            n_trees: 60,
            max_depth: 4,
            ..Default::default()
        };
        let model = GradientBoostedRegressor::fit(&features, &targets, config).unwrap();
        let predictions = model.predict(&features);
        let rmse = crate::ml::metrics::rmse(&targets, &predictions);
        assert!(rmse < 10.0, "rmse {} too high", rmse);
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let (features, targets) = linear_data();
        let config = GbmConfig {
            n_trees: 10,
            ..Default::default()
        };
        let a = GradientBoostedRegressor::fit(&features, &targets, config.clone()).unwrap();
        let b = GradientBoostedRegressor::fit(&features, &targets, config).unwrap();
        assert_eq!(a.predict_row(&[5.0, 2.0]), b.predict_row(&[5.0, 2.0]));
    }

    #[test]
    fn empty_input_is_rejected() {
        let features = Array2::<f64>::zeros((0, 3));
        let targets = array![];
        assert!(GradientBoostedRegressor::fit(&features, &targets, GbmConfig::default()).is_err());
    }

    #[test]
    fn model_round_trips_through_json() {
        let (features, targets) = linear_data();
        let config = GbmConfig {
            n_trees: 5,
            ..Default::default()
        };
        let model = GradientBoostedRegressor::fit(&features, &targets, config).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: GradientBoostedRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(model.predict_row(&[3.0, 1.0]), restored.predict_row(&[3.0, 1.0]));
    }
}
