//! Forecast assembly
//!
//! Loads the trained model artifacts and turns an environmental snapshot
//! into the 48-hour forecast series the dashboard renders.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use shared::{overall_aqi, ForecastPoint, Location, Pollutant};

use crate::cache::TtlCache;
use crate::error::{AppError, AppResult};
use crate::ml::GradientBoostedRegressor;
use crate::services::environment::EnvironmentalDataService;
use crate::services::features::{FeatureEngineer, NormalizationParams};

/// Trained model artifacts loaded from disk
pub struct ModelStore {
    pub models: BTreeMap<Pollutant, GradientBoostedRegressor>,
    pub feature_columns: Vec<String>,
    pub normalization: NormalizationParams,
}

impl ModelStore {
    /// Load artifacts from the models directory.
    ///
    /// A missing directory or missing feature metadata is fatal. A missing
    /// individual model only drops that pollutant from the forecasts; having
    /// no model at all is fatal again.
    pub fn load(dir: &Path) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::ModelsUnavailable);
        }

        let feature_columns: Vec<String> = read_artifact(&dir.join("feature_columns.json"))?;
        let normalization: NormalizationParams = read_artifact(&dir.join("normalization.json"))?;

        let mut models = BTreeMap::new();
        for pollutant in Pollutant::ALL {
            let path = dir.join(format!("gbm_{}.json", pollutant.file_stem()));
            if !path.is_file() {
                warn!(pollutant = %pollutant, "no model artifact, pollutant omitted from forecasts");
                continue;
            }
            let model: GradientBoostedRegressor = read_artifact(&path)?;
            models.insert(pollutant, model);
        }

        if models.is_empty() {
            return Err(AppError::ModelsUnavailable);
        }

        info!(
            pollutants = models.len(),
            features = feature_columns.len(),
            "model artifacts loaded"
        );
        Ok(Self {
            models,
            feature_columns,
            normalization,
        })
    }
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::ModelArtifact(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::ModelArtifact(format!("cannot parse {}: {}", path.display(), e)))
}

/// Forecast service: models plus environmental data, with a per-location
/// result cache.
pub struct ForecastService {
    environment: Arc<EnvironmentalDataService>,
    store: Option<ModelStore>,
    cache: TtlCache<(i64, i64), Vec<ForecastPoint>>,
}

impl ForecastService {
    /// `store` is `None` when startup found no artifacts; the service then
    /// answers every forecast request with a models-unavailable error while
    /// the rest of the API keeps working.
    pub fn new(
        environment: Arc<EnvironmentalDataService>,
        store: Option<ModelStore>,
        forecast_ttl: Duration,
    ) -> Self {
        Self {
            environment,
            store,
            cache: TtlCache::new(forecast_ttl),
        }
    }

    pub fn models_loaded(&self) -> bool {
        self.store.is_some()
    }

    /// Produce the 17-point forecast series for a location
    pub async fn forecast(&self, location: &Location) -> AppResult<Vec<ForecastPoint>> {
        let store = self.store.as_ref().ok_or(AppError::ModelsUnavailable)?;

        let key = location.cache_key();
        if let Some(points) = self.cache.get(&key) {
            return Ok(points);
        }

        let point = location.point();
        let snapshot = self.environment.snapshot(point).await;
        let timestamps = FeatureEngineer::forecast_timestamps(Utc::now());

        let vectors: Vec<_> = timestamps
            .iter()
            .map(|ts| {
                FeatureEngineer::build_features(
                    point.latitude,
                    point.longitude,
                    *ts,
                    &snapshot,
                    &store.normalization,
                )
            })
            .collect();
        let matrix = FeatureEngineer::to_matrix(&vectors, &store.feature_columns);

        let points: Vec<ForecastPoint> = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                let row: Vec<f64> = matrix.row(i).to_vec();
                let mut concentrations = BTreeMap::new();
                for (pollutant, model) in &store.models {
                    // Concentrations cannot be negative; clamp model output.
                    concentrations.insert(*pollutant, model.predict_row(&row).max(0.0));
                }
                let aqi = overall_aqi(&concentrations);
                ForecastPoint {
                    timestamp: *ts,
                    concentrations,
                    aqi,
                }
            })
            .collect();

        self.cache.insert(key, points.clone());
        Ok(points)
    }
}
