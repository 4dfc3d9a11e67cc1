//! Forecast service tests
//!
//! End-to-end forecast assembly against stub model artifacts and offline
//! fetchers: the dashboard contract is a full 17-point series with AQI and
//! category data even when every upstream is down.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use shared::{AqiCategory, Location, Pollutant};

use mframapa_backend::external::build_http_client;
use mframapa_backend::external::merra2::Merra2Client;
use mframapa_backend::external::tempo::TempoClient;
use mframapa_backend::external::weather::WeatherClient;
use mframapa_backend::ml::{GbmConfig, GradientBoostedRegressor};
use mframapa_backend::services::environment::EnvironmentalDataService;
use mframapa_backend::services::features::{NormalizationParams, BASE_FEATURE_COLUMNS};
use mframapa_backend::services::forecast::{ForecastService, ModelStore};

const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

fn offline_environment() -> Arc<EnvironmentalDataService> {
    let http = build_http_client(1).expect("client");
    EnvironmentalDataService::new(
        WeatherClient::new(http.clone(), DEAD_ENDPOINT.to_string(), "key".to_string()),
        Merra2Client::new(
            http.clone(),
            DEAD_ENDPOINT.to_string(),
            "user".to_string(),
            "pass".to_string(),
        ),
        TempoClient::new(
            http,
            DEAD_ENDPOINT.to_string(),
            "user".to_string(),
            "pass".to_string(),
        ),
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
}

/// Constant-output model: no trees, so every prediction equals `init`
fn write_stub_artifacts(dir: &Path, pm25_value: f64) {
    let model = GradientBoostedRegressor {
        init: pm25_value,
        trees: Vec::new(),
        config: GbmConfig::default(),
    };
    fs::write(
        dir.join("gbm_pm25.json"),
        serde_json::to_vec(&model).unwrap(),
    )
    .unwrap();

    let columns: Vec<String> = BASE_FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    fs::write(
        dir.join("feature_columns.json"),
        serde_json::to_vec(&columns).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("normalization.json"),
        serde_json::to_vec(&NormalizationParams::identity()).unwrap(),
    )
    .unwrap();
    fs::write(dir.join("encoders.json"), b"{}").unwrap();
}

#[tokio::test]
async fn accra_forecast_covers_the_full_horizon() {
    let models = TempDir::new().unwrap();
    write_stub_artifacts(models.path(), 42.0);

    let store = ModelStore::load(models.path()).expect("artifacts load");
    let service = ForecastService::new(offline_environment(), Some(store), Duration::from_secs(60));

    let accra = Location::new("Accra, Ghana", 5.6037, -0.187);
    let points = service.forecast(&accra).await.expect("forecast succeeds");

    assert_eq!(points.len(), 17);
    for pair in points.windows(2) {
        assert_eq!((pair[1].timestamp - pair[0].timestamp).num_hours(), 3);
    }

    for point in &points {
        // Constant stub model: 42 μg/m³ of PM2.5 everywhere
        assert_eq!(point.concentrations[&Pollutant::Pm25], 42.0);
        assert_eq!(point.aqi.by_pollutant[&Pollutant::Pm25], 117);
        assert_eq!(point.aqi.overall, 117);
        assert_eq!(point.aqi.dominant, Some(Pollutant::Pm25));

        let category = AqiCategory::from_aqi(point.aqi.overall);
        assert_eq!(category.name(), "Unhealthy for Sensitive Groups");
        assert_eq!(category.color(), "#FF7E00");
    }
}

#[tokio::test]
async fn negative_model_output_clamps_to_zero() {
    let models = TempDir::new().unwrap();
    write_stub_artifacts(models.path(), -12.5);

    let store = ModelStore::load(models.path()).expect("artifacts load");
    let service = ForecastService::new(offline_environment(), Some(store), Duration::from_secs(60));

    let points = service
        .forecast(&Location::new("Accra", 5.6037, -0.187))
        .await
        .expect("forecast succeeds");
    assert!(points
        .iter()
        .all(|p| p.concentrations[&Pollutant::Pm25] == 0.0));
    assert!(points.iter().all(|p| p.aqi.overall == 0));
}

#[tokio::test]
async fn repeated_requests_hit_the_forecast_cache() {
    let models = TempDir::new().unwrap();
    write_stub_artifacts(models.path(), 10.0);

    let store = ModelStore::load(models.path()).expect("artifacts load");
    let service = ForecastService::new(offline_environment(), Some(store), Duration::from_secs(60));

    let accra = Location::new("Accra", 5.6037, -0.187);
    let first = service.forecast(&accra).await.unwrap();
    let second = service.forecast(&accra).await.unwrap();
    // Cached: identical timestamps, not a re-run with a fresh clock
    assert_eq!(first[0].timestamp, second[0].timestamp);
}

#[tokio::test]
async fn missing_models_is_a_load_error() {
    let empty = TempDir::new().unwrap();
    assert!(ModelStore::load(empty.path()).is_err());
    assert!(ModelStore::load(Path::new("/nonexistent/models")).is_err());
}

#[tokio::test]
async fn service_without_models_rejects_forecasts_but_reports_state() {
    let service = ForecastService::new(offline_environment(), None, Duration::from_secs(60));
    assert!(!service.models_loaded());

    let result = service
        .forecast(&Location::new("Accra", 5.6037, -0.187))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn partial_artifact_set_still_loads() {
    let models = TempDir::new().unwrap();
    write_stub_artifacts(models.path(), 42.0);
    // Only the PM2.5 model exists; O3 and NO2 are omitted, not fatal

    let store = ModelStore::load(models.path()).expect("artifacts load");
    assert_eq!(store.models.len(), 1);
    assert!(store.models.contains_key(&Pollutant::Pm25));
}
