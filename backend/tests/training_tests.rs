//! Training pipeline tests
//!
//! End-to-end runs over synthetic measurement CSVs in a temp directory:
//! ingestion of both supported layouts, the minimum-sample skip rule, and
//! the persisted artifact set.

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use mframapa_backend::ml::{GbmConfig, GradientBoostedRegressor};
use mframapa_backend::services::features::NormalizationParams;
use mframapa_backend::services::training::{TrainingPipeline, MIN_SAMPLES_PER_POLLUTANT};

fn small_config() -> GbmConfig {
    GbmConfig {
        n_trees: 8,
        max_depth: 3,
        ..Default::default()
    }
}

/// EPA daily-summary layout with `rows` recent measurements per parameter
fn write_epa_csv(dir: &Path, parameter: &str, rows: usize) {
    let mut csv = String::from(
        "\"Date Local\",\"Parameter Name\",\"Arithmetic Mean\",\"Latitude\",\"Longitude\"\n",
    );
    let start = Utc::now().date_naive() - Duration::days(rows as i64);
    for i in 0..rows {
        let date = start + Duration::days(i as i64);
        // A seasonal signal with spatial variation, always non-negative
        let value = 20.0 + 10.0 * ((i % 30) as f64 / 30.0) + (i % 3) as f64;
        let lat = 33.0 + (i % 5) as f64 * 0.5;
        let lon = -118.0 + (i % 5) as f64 * 0.5;
        csv.push_str(&format!(
            "{},\"{}\",{},{},{}\n",
            date, parameter, value, lat, lon
        ));
    }
    let stem = parameter.replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    fs::write(dir.join(format!("epa_{}.csv", stem)), csv).expect("write csv");
}

/// Sensor-export layout: date column plus pollutant columns, no coordinates
fn write_sensor_csv(dir: &Path, rows: usize) {
    let mut csv = String::from("date,pm25,no2\n");
    let start = Utc::now().date_naive() - Duration::days(rows as i64);
    for i in 0..rows {
        let date = start + Duration::days(i as i64);
        csv.push_str(&format!("{},{},{}\n", date, 15.0 + (i % 12) as f64, 20.0 + (i % 7) as f64));
    }
    fs::write(dir.join("accra_sensors.csv"), csv).expect("write csv");
}

#[tokio::test]
async fn trains_and_persists_full_artifact_set() {
    let data = TempDir::new().unwrap();
    let models = TempDir::new().unwrap();
    write_epa_csv(data.path(), "PM2.5 - Local Conditions", 150);
    write_epa_csv(data.path(), "Ozone", 150);
    write_epa_csv(data.path(), "Nitrogen dioxide (NO2)", 150);

    let pipeline = TrainingPipeline::new(data.path(), models.path(), small_config());
    let report = pipeline.run().await.expect("training succeeds");

    assert_eq!(report.trained.len(), 3);
    assert!(report.skipped.is_empty());
    for entry in &report.trained {
        assert_eq!(entry.samples, 150);
        assert!(entry.rmse.is_finite());
    }

    for file in [
        "gbm_pm25.json",
        "gbm_o3.json",
        "gbm_no2.json",
        "feature_columns.json",
        "normalization.json",
        "encoders.json",
    ] {
        assert!(models.path().join(file).is_file(), "missing {}", file);
    }

    // Artifacts parse back into their runtime types
    let model: GradientBoostedRegressor = serde_json::from_slice(
        &fs::read(models.path().join("gbm_pm25.json")).unwrap(),
    )
    .expect("model parses");
    assert!(!model.trees.is_empty());

    let normalization: NormalizationParams = serde_json::from_slice(
        &fs::read(models.path().join("normalization.json")).unwrap(),
    )
    .expect("normalization parses");
    assert!(normalization.lat_std > 0.0);

    let columns: Vec<String> = serde_json::from_slice(
        &fs::read(models.path().join("feature_columns.json")).unwrap(),
    )
    .expect("columns parse");
    assert!(columns.contains(&"lat_norm".to_string()));
    assert!(columns.contains(&"month_sin".to_string()));
}

#[tokio::test]
async fn thin_pollutants_are_skipped_with_a_reason() {
    let data = TempDir::new().unwrap();
    let models = TempDir::new().unwrap();
    write_epa_csv(data.path(), "PM2.5 - Local Conditions", 150);
    write_epa_csv(data.path(), "Ozone", MIN_SAMPLES_PER_POLLUTANT - 1);

    let pipeline = TrainingPipeline::new(data.path(), models.path(), small_config());
    let report = pipeline.run().await.expect("training succeeds");

    assert_eq!(report.trained.len(), 1);
    assert!(report
        .skipped
        .iter()
        .any(|(p, reason)| p.name() == "O3" && reason.contains("samples")));
    assert!(models.path().join("gbm_pm25.json").is_file());
    assert!(!models.path().join("gbm_o3.json").is_file());
}

#[tokio::test]
async fn sensor_layout_is_pinned_to_accra() {
    let data = TempDir::new().unwrap();
    let models = TempDir::new().unwrap();
    write_sensor_csv(data.path(), 200);

    let pipeline = TrainingPipeline::new(data.path(), models.path(), small_config());
    let samples = pipeline.ingest().expect("ingestion succeeds");

    assert!(!samples.is_empty());
    assert!(samples
        .iter()
        .all(|s| s.latitude == 5.6037 && s.longitude == -0.187));
    // Both pollutant columns were picked up
    assert!(samples.iter().any(|s| s.pollutant.name() == "PM2.5"));
    assert!(samples.iter().any(|s| s.pollutant.name() == "NO2"));
}

#[tokio::test]
async fn stale_and_negative_rows_are_dropped() {
    let data = TempDir::new().unwrap();
    let models = TempDir::new().unwrap();

    let old_date = Utc::now().date_naive() - Duration::days(900);
    let recent = Utc::now().date_naive() - Duration::days(10);
    let csv = format!(
        "\"Date Local\",\"Parameter Name\",\"Arithmetic Mean\",\"Latitude\",\"Longitude\"\n\
         {},\"Ozone\",30.0,33.0,-118.0\n\
         {},\"Ozone\",-4.0,33.0,-118.0\n\
         {},\"Ozone\",30.0,33.0,-118.0\n",
        old_date, recent, recent
    );
    fs::write(data.path().join("epa.csv"), csv).unwrap();

    let pipeline = TrainingPipeline::new(data.path(), models.path(), small_config());
    let samples = pipeline.ingest().expect("ingestion succeeds");
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].value, 30.0);
}

#[tokio::test]
async fn empty_data_directory_is_an_error() {
    let data = TempDir::new().unwrap();
    let models = TempDir::new().unwrap();

    let pipeline = TrainingPipeline::new(data.path(), models.path(), small_config());
    assert!(pipeline.run().await.is_err());
}
