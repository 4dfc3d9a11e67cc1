//! Feature engineering shared by training and inference
//!
//! Every feature the models see is built here, from the same code path, so
//! training-time and forecast-time representations cannot drift apart.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use shared::{FORECAST_HORIZON_HOURS, FORECAST_STEP_HOURS};

use crate::services::environment::EnvironmentalSnapshot;

/// Spatial normalization parameters, fitted once at training time and frozen
/// into the model artifacts for inference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizationParams {
    pub lat_mean: f64,
    pub lat_std: f64,
    pub lon_mean: f64,
    pub lon_std: f64,
}

impl NormalizationParams {
    /// Fit mean/std over the training coordinates. A degenerate (constant)
    /// axis gets unit scale so normalization stays well-defined.
    pub fn fit(latitudes: &[f64], longitudes: &[f64]) -> Self {
        let (lat_mean, lat_std) = mean_std(latitudes);
        let (lon_mean, lon_std) = mean_std(longitudes);
        Self {
            lat_mean,
            lat_std,
            lon_mean,
            lon_std,
        }
    }

    /// Identity transform, for data without a fitted set
    pub fn identity() -> Self {
        Self {
            lat_mean: 0.0,
            lat_std: 1.0,
            lon_mean: 0.0,
            lon_std: 1.0,
        }
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let std = var.sqrt();
    (mean, if std > 0.0 { std } else { 1.0 })
}

/// Temporal and spatial feature names, in canonical model-input order
pub const BASE_FEATURE_COLUMNS: [&str; 21] = [
    "lat",
    "lon",
    "lat_norm",
    "lon_norm",
    "year",
    "month",
    "day",
    "dayofweek",
    "dayofyear",
    "week",
    "season",
    "is_weekend",
    "month_sin",
    "month_cos",
    "day_sin",
    "day_cos",
    "dayofweek_sin",
    "dayofweek_cos",
    "lat_month",
    "lon_month",
    "lat_lon",
];

/// Feature engineering for the forecasting models
pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Temporal and spatial features for one (location, timestamp) pair
    pub fn base_features(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        params: &NormalizationParams,
    ) -> BTreeMap<String, f64> {
        let month = timestamp.month() as f64;
        let day = timestamp.day() as f64;
        // Monday = 0, matching the training data convention
        let dayofweek = timestamp.weekday().num_days_from_monday() as f64;

        let lat_norm = (latitude - params.lat_mean) / params.lat_std;
        let lon_norm = (longitude - params.lon_mean) / params.lon_std;

        let mut features = BTreeMap::new();
        features.insert("lat".to_string(), latitude);
        features.insert("lon".to_string(), longitude);
        features.insert("lat_norm".to_string(), lat_norm);
        features.insert("lon_norm".to_string(), lon_norm);
        features.insert("year".to_string(), timestamp.year() as f64);
        features.insert("month".to_string(), month);
        features.insert("day".to_string(), day);
        features.insert("dayofweek".to_string(), dayofweek);
        features.insert("dayofyear".to_string(), timestamp.ordinal() as f64);
        features.insert("week".to_string(), timestamp.iso_week().week() as f64);
        features.insert("season".to_string(), ((month as u32 - 1) / 3) as f64);
        features.insert(
            "is_weekend".to_string(),
            if dayofweek >= 5.0 { 1.0 } else { 0.0 },
        );
        features.insert("month_sin".to_string(), (2.0 * PI * month / 12.0).sin());
        features.insert("month_cos".to_string(), (2.0 * PI * month / 12.0).cos());
        features.insert("day_sin".to_string(), (2.0 * PI * day / 31.0).sin());
        features.insert("day_cos".to_string(), (2.0 * PI * day / 31.0).cos());
        features.insert(
            "dayofweek_sin".to_string(),
            (2.0 * PI * dayofweek / 7.0).sin(),
        );
        features.insert(
            "dayofweek_cos".to_string(),
            (2.0 * PI * dayofweek / 7.0).cos(),
        );
        // Interactions are in normalized space so they stay scale-free
        // across regions
        features.insert("lat_month".to_string(), lat_norm * month);
        features.insert("lon_month".to_string(), lon_norm * month);
        features.insert("lat_lon".to_string(), lat_norm * lon_norm);
        features
    }

    /// Full feature vector: base features plus everything from an
    /// environmental snapshot.
    pub fn build_features(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        snapshot: &EnvironmentalSnapshot,
        params: &NormalizationParams,
    ) -> BTreeMap<String, f64> {
        let mut features = Self::base_features(latitude, longitude, timestamp, params);

        // Weather: take the series point nearest in time to this step.
        if let Some(point) = snapshot
            .weather
            .iter()
            .min_by_key(|p| (p.timestamp - timestamp).num_seconds().abs())
        {
            features.insert("weather_temp".to_string(), point.temperature);
            features.insert("weather_humidity".to_string(), point.humidity);
            features.insert("weather_pressure".to_string(), point.pressure);
            features.insert("weather_wind_speed".to_string(), point.wind_speed);
            features.insert("weather_clouds".to_string(), point.cloud_cover);
        }

        for (variable, value) in &snapshot.reanalysis {
            features.insert(format!("merra2_{}", variable), *value);
        }

        for (name, value) in &snapshot.trace_gas {
            features.insert(format!("tempo_{}", name), *value);
        }

        // Derived features. Prefer the weather pair for the interaction and
        // fall back to the reanalysis equivalents.
        let temp = features
            .get("weather_temp")
            .or_else(|| features.get("merra2_T2M"))
            .copied();
        let humidity = features
            .get("weather_humidity")
            .or_else(|| features.get("merra2_RH2M"))
            .copied();
        if let (Some(t), Some(h)) = (temp, humidity) {
            features.insert("temp_humidity_interaction".to_string(), t * h);
        }

        if let (Some(u), Some(v)) = (
            features.get("merra2_U2M").copied(),
            features.get("merra2_V2M").copied(),
        ) {
            features.insert("wind_speed".to_string(), (u * u + v * v).sqrt());
        }

        features
    }

    /// The 17 timestamps of a forecast run: t=0 through +48h in 3h steps
    pub fn forecast_timestamps(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        (0..=FORECAST_HORIZON_HOURS / FORECAST_STEP_HOURS)
            .map(|step| now + ChronoDuration::hours(step * FORECAST_STEP_HOURS))
            .collect()
    }

    /// Assemble feature maps into a dense matrix in the column order the
    /// model was trained with. Missing columns are zero-filled (logged once
    /// per call), non-finite values are scrubbed to zero.
    pub fn to_matrix(
        vectors: &[BTreeMap<String, f64>],
        feature_columns: &[String],
    ) -> Array2<f64> {
        let mut matrix = Array2::zeros((vectors.len(), feature_columns.len()));
        let mut missing: Vec<&str> = Vec::new();

        for (row, features) in vectors.iter().enumerate() {
            for (col, name) in feature_columns.iter().enumerate() {
                match features.get(name) {
                    Some(value) if value.is_finite() => matrix[[row, col]] = *value,
                    Some(_) => matrix[[row, col]] = 0.0,
                    None => {
                        if row == 0 {
                            missing.push(name);
                        }
                    }
                }
            }
        }

        if !missing.is_empty() {
            warn!(
                columns = ?missing,
                "feature columns absent from input, zero-filled"
            );
        }

        matrix
    }
}
