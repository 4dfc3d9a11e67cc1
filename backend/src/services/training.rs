//! Offline model training pipeline
//!
//! Ingests ground-truth measurement CSVs, engineers features with the same
//! code inference uses, trains one gradient-boosted model per pollutant and
//! persists the artifacts the forecast service loads at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{info, warn};

use shared::{GeoPoint, Pollutant};

use crate::error::{AppError, AppResult};
use crate::ml::metrics::{mae, r2, rmse};
use crate::ml::{GbmConfig, GradientBoostedRegressor};
use crate::services::environment::EnvironmentalDataService;
use crate::services::features::{
    FeatureEngineer, NormalizationParams, BASE_FEATURE_COLUMNS,
};

/// Minimum usable samples per pollutant; below this the pollutant is skipped
pub const MIN_SAMPLES_PER_POLLUTANT: usize = 100;

/// Only measurements from the trailing window participate in training
const TRAINING_WINDOW_DAYS: i64 = 730;

/// Accra ground-station coordinates, applied to the Ghana sensor export
/// which carries no per-row position.
const ACCRA: GeoPoint = GeoPoint {
    latitude: 5.6037,
    longitude: -0.187,
};

/// One ground-truth measurement after ingestion and cleaning
#[derive(Debug, Clone)]
pub struct TrainingSample {
    pub pollutant: Pollutant,
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

/// EPA AQS daily summary row
#[derive(Debug, Deserialize)]
struct EpaDailyRow {
    #[serde(rename = "Date Local")]
    date_local: String,
    #[serde(rename = "Parameter Name")]
    parameter_name: String,
    #[serde(rename = "Arithmetic Mean")]
    arithmetic_mean: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// Per-pollutant training outcome
#[derive(Debug, Clone)]
pub struct PollutantReport {
    pub pollutant: Pollutant,
    pub samples: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

/// Full pipeline outcome: trained pollutants plus skip reasons
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub trained: Vec<PollutantReport>,
    pub skipped: Vec<(Pollutant, String)>,
}

impl std::fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for report in &self.trained {
            writeln!(
                f,
                "{}: {} samples, rmse {:.3}, mae {:.3}, r2 {:.3}",
                report.pollutant, report.samples, report.rmse, report.mae, report.r2
            )?;
        }
        for (pollutant, reason) in &self.skipped {
            writeln!(f, "{}: skipped ({})", pollutant, reason)?;
        }
        Ok(())
    }
}

/// Offline training pipeline
pub struct TrainingPipeline {
    data_dir: PathBuf,
    models_dir: PathBuf,
    config: GbmConfig,
    environment: Option<Arc<EnvironmentalDataService>>,
}

impl TrainingPipeline {
    pub fn new(data_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>, config: GbmConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            models_dir: models_dir.into(),
            config,
            environment: None,
        }
    }

    /// Join environmental data into the training features. Without this the
    /// models train on temporal and spatial features alone.
    pub fn with_environment(mut self, environment: Arc<EnvironmentalDataService>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Run the full pipeline: ingest, clean, engineer, train, evaluate and
    /// persist.
    pub async fn run(&self) -> AppResult<TrainingReport> {
        let samples = self.ingest()?;
        if samples.is_empty() {
            return Err(AppError::Training(format!(
                "no usable training samples found under {}",
                self.data_dir.display()
            )));
        }
        info!(samples = samples.len(), "training data ingested");

        let latitudes: Vec<f64> = samples.iter().map(|s| s.latitude).collect();
        let longitudes: Vec<f64> = samples.iter().map(|s| s.longitude).collect();
        let normalization = NormalizationParams::fit(&latitudes, &longitudes);

        let snapshots = self.location_snapshots(&samples).await;

        let mut by_pollutant: BTreeMap<Pollutant, Vec<&TrainingSample>> = BTreeMap::new();
        for sample in &samples {
            by_pollutant.entry(sample.pollutant).or_default().push(sample);
        }

        fs::create_dir_all(&self.models_dir)?;

        let mut report = TrainingReport::default();
        let mut feature_columns: Option<Vec<String>> = None;

        for pollutant in Pollutant::ALL {
            let Some(pollutant_samples) = by_pollutant.get(&pollutant) else {
                let reason = "no samples in training data".to_string();
                warn!(pollutant = %pollutant, "{}", reason);
                report.skipped.push((pollutant, reason));
                continue;
            };
            if pollutant_samples.len() < MIN_SAMPLES_PER_POLLUTANT {
                let reason = format!(
                    "only {} samples, need at least {}",
                    pollutant_samples.len(),
                    MIN_SAMPLES_PER_POLLUTANT
                );
                warn!(pollutant = %pollutant, "{}", reason);
                report.skipped.push((pollutant, reason));
                continue;
            }

            let vectors: Vec<BTreeMap<String, f64>> = pollutant_samples
                .iter()
                .map(|s| self.sample_features(s, &normalization, &snapshots))
                .collect();
            let columns = feature_columns
                .get_or_insert_with(|| column_order(&vectors))
                .clone();

            let features = FeatureEngineer::to_matrix(&vectors, &columns);
            let targets = Array1::from_iter(pollutant_samples.iter().map(|s| s.value));

            // Seeded 80/20 holdout split
            let mut indices: Vec<usize> = (0..pollutant_samples.len()).collect();
            indices.shuffle(&mut StdRng::seed_from_u64(self.config.seed));
            let split = (indices.len() * 4) / 5;
            let (train_idx, test_idx) = indices.split_at(split);

            let train_x = features.select(ndarray::Axis(0), train_idx);
            let train_y = targets.select(ndarray::Axis(0), train_idx);
            let test_x = features.select(ndarray::Axis(0), test_idx);
            let test_y = targets.select(ndarray::Axis(0), test_idx);

            let model = GradientBoostedRegressor::fit(&train_x, &train_y, self.config.clone())?;
            let predictions = model.predict(&test_x);

            let entry = PollutantReport {
                pollutant,
                samples: pollutant_samples.len(),
                rmse: rmse(&test_y, &predictions),
                mae: mae(&test_y, &predictions),
                r2: r2(&test_y, &predictions),
            };
            info!(
                pollutant = %pollutant,
                rmse = entry.rmse,
                mae = entry.mae,
                r2 = entry.r2,
                "model trained"
            );

            let path = self
                .models_dir
                .join(format!("gbm_{}.json", pollutant.file_stem()));
            fs::write(&path, serde_json::to_vec_pretty(&model)?)?;
            report.trained.push(entry);
        }

        if report.trained.is_empty() {
            return Err(AppError::Training(
                "no pollutant had enough samples to train a model".to_string(),
            ));
        }

        let columns = feature_columns.unwrap_or_else(|| {
            BASE_FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
        });
        fs::write(
            self.models_dir.join("feature_columns.json"),
            serde_json::to_vec_pretty(&columns)?,
        )?;
        fs::write(
            self.models_dir.join("normalization.json"),
            serde_json::to_vec_pretty(&normalization)?,
        )?;
        // No categorical features today; the empty map keeps the artifact
        // layout stable for consumers.
        fs::write(
            self.models_dir.join("encoders.json"),
            serde_json::to_vec_pretty(&BTreeMap::<String, Vec<String>>::new())?,
        )?;

        Ok(report)
    }

    /// Read every CSV under the data directory, in both supported layouts,
    /// and keep only finite non-negative values inside the training window.
    pub fn ingest(&self) -> AppResult<Vec<TrainingSample>> {
        let cutoff = Utc::now().date_naive() - ChronoDuration::days(TRAINING_WINDOW_DAYS);
        let mut samples = Vec::new();

        let entries = fs::read_dir(&self.data_dir).map_err(|e| {
            AppError::Training(format!(
                "cannot read data directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let parsed = if is_epa_layout(&path)? {
                read_epa_csv(&path)?
            } else {
                read_sensor_csv(&path)?
            };
            samples.extend(parsed);
        }

        samples.retain(|s| s.value.is_finite() && s.value >= 0.0 && s.date >= cutoff);
        Ok(samples)
    }

    fn sample_features(
        &self,
        sample: &TrainingSample,
        normalization: &NormalizationParams,
        snapshots: &BTreeMap<(i64, i64), crate::services::environment::EnvironmentalSnapshot>,
    ) -> BTreeMap<String, f64> {
        let timestamp = Utc
            .from_utc_datetime(&sample.date.and_hms_opt(0, 0, 0).unwrap_or_default());
        let key = (
            (sample.latitude * 1e4).round() as i64,
            (sample.longitude * 1e4).round() as i64,
        );
        match snapshots.get(&key) {
            Some(snapshot) => FeatureEngineer::build_features(
                sample.latitude,
                sample.longitude,
                timestamp,
                snapshot,
                normalization,
            ),
            None => FeatureEngineer::base_features(
                sample.latitude,
                sample.longitude,
                timestamp,
                normalization,
            ),
        }
    }

    /// One environmental snapshot per distinct sample location, when the
    /// environmental join is enabled.
    async fn location_snapshots(
        &self,
        samples: &[TrainingSample],
    ) -> BTreeMap<(i64, i64), crate::services::environment::EnvironmentalSnapshot> {
        let mut snapshots = BTreeMap::new();
        let Some(environment) = &self.environment else {
            return snapshots;
        };

        let locations: BTreeSet<(i64, i64)> = samples
            .iter()
            .map(|s| {
                (
                    (s.latitude * 1e4).round() as i64,
                    (s.longitude * 1e4).round() as i64,
                )
            })
            .collect();

        for key in locations {
            let point = GeoPoint::new(key.0 as f64 / 1e4, key.1 as f64 / 1e4);
            snapshots.insert(key, environment.snapshot(point).await);
        }
        snapshots
    }
}

/// Stable column order: base columns first, then any environmental columns
/// sorted by name.
fn column_order(vectors: &[BTreeMap<String, f64>]) -> Vec<String> {
    let mut columns: Vec<String> = BASE_FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut extra: BTreeSet<String> = BTreeSet::new();
    for vector in vectors {
        for name in vector.keys() {
            if !BASE_FEATURE_COLUMNS.contains(&name.as_str()) {
                extra.insert(name.clone());
            }
        }
    }
    columns.extend(extra);
    columns
}

fn is_epa_layout(path: &Path) -> AppResult<bool> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Training(format!("cannot open {}: {}", path.display(), e)))?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::Training(format!("cannot read headers of {}: {}", path.display(), e)))?;
    Ok(headers.iter().any(|h| h.trim() == "Parameter Name"))
}

fn read_epa_csv(path: &Path) -> AppResult<Vec<TrainingSample>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Training(format!("cannot open {}: {}", path.display(), e)))?;
    let mut samples = Vec::new();

    for result in reader.deserialize::<EpaDailyRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed row");
                continue;
            }
        };
        let Some(pollutant) = Pollutant::parse(&row.parameter_name) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&row.date_local, "%Y-%m-%d") else {
            continue;
        };
        samples.push(TrainingSample {
            pollutant,
            date,
            latitude: row.latitude,
            longitude: row.longitude,
            value: row.arithmetic_mean,
        });
    }
    Ok(samples)
}

/// Sensor export layout: a date column plus one column per pollutant, no
/// position. Header names vary, so columns are located by trimmed,
/// case-insensitive match. All rows are pinned to the Accra station.
fn read_sensor_csv(path: &Path) -> AppResult<Vec<TrainingSample>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Training(format!("cannot open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::Training(format!("cannot read headers of {}: {}", path.display(), e)))?
        .clone();

    let find = |wanted: &[&str]| -> Option<usize> {
        headers.iter().position(|h| {
            let h = h.trim().to_lowercase();
            wanted.iter().any(|w| h == *w)
        })
    };

    let Some(date_col) = find(&["date", "date local", "timestamp"]) else {
        warn!(file = %path.display(), "no date column found, skipping file");
        return Ok(Vec::new());
    };
    let pollutant_cols: Vec<(Pollutant, usize)> = [
        (Pollutant::Pm25, find(&["pm25", "pm2.5", "pm_2_5"])),
        (Pollutant::O3, find(&["o3", "ozone"])),
        (Pollutant::No2, find(&["no2"])),
    ]
    .into_iter()
    .filter_map(|(p, col)| col.map(|c| (p, c)))
    .collect();

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed row");
                continue;
            }
        };
        let Some(raw_date) = record.get(date_col) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d") else {
            continue;
        };
        for (pollutant, col) in &pollutant_cols {
            if let Some(value) = record.get(*col).and_then(|v| v.trim().parse::<f64>().ok()) {
                samples.push(TrainingSample {
                    pollutant: *pollutant,
                    date,
                    latitude: ACCRA.latitude,
                    longitude: ACCRA.longitude,
                    value,
                });
            }
        }
    }
    Ok(samples)
}
