//! Gradient-boosted regression
//!
//! A self-contained boosting engine over axis-aligned regression trees,
//! serialized to JSON so trained models survive restarts and ship as plain
//! artifacts.

pub mod gbm;
pub mod metrics;
pub mod tree;

pub use gbm::{GbmConfig, GradientBoostedRegressor};
pub use tree::RegressionTree;
