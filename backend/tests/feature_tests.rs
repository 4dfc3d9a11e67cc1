//! Feature engineering tests
//!
//! Property-based and unit tests for:
//! - Feature vector completeness and finiteness for any input
//! - Training/inference normalization consistency
//! - Matrix assembly column ordering

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use mframapa_backend::services::environment::{
    fallback_trace_gas, fallback_weather_series, reanalysis_fallback, EnvironmentalSnapshot,
};
use mframapa_backend::services::features::{
    FeatureEngineer, NormalizationParams, BASE_FEATURE_COLUMNS,
};

fn fallback_snapshot() -> EnvironmentalSnapshot {
    let reanalysis = mframapa_backend::external::merra2::MERRA2_VARIABLES
        .iter()
        .map(|v| (v.to_string(), reanalysis_fallback(v)))
        .collect();
    EnvironmentalSnapshot {
        weather: fallback_weather_series(),
        reanalysis,
        trace_gas: fallback_trace_gas(),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Every base column exists and is finite for any coordinate and date
    #[test]
    fn base_features_are_total(
        lat in -90.0..90.0f64,
        lon in -180.0..180.0f64,
        days in 0i64..3650,
    ) {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(days);
        let features =
            FeatureEngineer::base_features(lat, lon, ts, &NormalizationParams::identity());

        for name in BASE_FEATURE_COLUMNS {
            let value = features.get(name);
            prop_assert!(value.is_some(), "missing column {}", name);
            prop_assert!(value.unwrap().is_finite(), "non-finite {}", name);
        }
    }

    /// Cyclical encodings stay on the unit circle
    #[test]
    fn cyclical_features_are_bounded(days in 0i64..3650) {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(days);
        let features =
            FeatureEngineer::base_features(0.0, 0.0, ts, &NormalizationParams::identity());

        for pair in [("month_sin", "month_cos"), ("day_sin", "day_cos"), ("dayofweek_sin", "dayofweek_cos")] {
            let (s, c) = (features[pair.0], features[pair.1]);
            prop_assert!((s * s + c * c - 1.0).abs() < 1e-9);
        }
    }

    /// The full vector with a fallback snapshot is finite everywhere
    #[test]
    fn full_features_are_finite(
        lat in -90.0..90.0f64,
        lon in -180.0..180.0f64,
    ) {
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let features = FeatureEngineer::build_features(
            lat,
            lon,
            ts,
            &fallback_snapshot(),
            &NormalizationParams::identity(),
        );
        prop_assert!(features.values().all(|v| v.is_finite()));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn environmental_columns_are_present_with_fallback_snapshot() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
    let features = FeatureEngineer::build_features(
        5.6037,
        -0.187,
        ts,
        &fallback_snapshot(),
        &NormalizationParams::identity(),
    );

    for name in [
        "weather_temp",
        "weather_humidity",
        "weather_pressure",
        "weather_wind_speed",
        "weather_clouds",
        "merra2_T2M",
        "merra2_PBLH",
        "tempo_NO2_column",
        "tempo_NO2_uncertainty",
        "temp_humidity_interaction",
        "wind_speed",
    ] {
        assert!(features.contains_key(name), "missing {}", name);
    }

    // Fallback snapshot: calm reanalysis winds and a 25 °C / 60 % series
    assert_eq!(features["wind_speed"], 0.0);
    assert_eq!(features["temp_humidity_interaction"], 25.0 * 60.0);
}

#[test]
fn normalization_is_identical_across_calls() {
    let params = NormalizationParams::fit(&[5.0, 6.0, 7.0], &[-1.0, 0.0, 1.0]);
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

    let train_view = FeatureEngineer::base_features(6.5, 0.5, ts, &params);
    let infer_view = FeatureEngineer::base_features(6.5, 0.5, ts, &params);
    assert_eq!(train_view["lat_norm"], infer_view["lat_norm"]);
    assert_eq!(train_view["lon_norm"], infer_view["lon_norm"]);
}

#[test]
fn matrix_respects_column_order() {
    let mut a = BTreeMap::new();
    a.insert("x".to_string(), 1.0);
    a.insert("y".to_string(), 2.0);
    let mut b = BTreeMap::new();
    b.insert("x".to_string(), 3.0);
    b.insert("y".to_string(), 4.0);

    let columns = vec!["y".to_string(), "x".to_string()];
    let matrix = FeatureEngineer::to_matrix(&[a, b], &columns);
    assert_eq!(matrix[[0, 0]], 2.0);
    assert_eq!(matrix[[0, 1]], 1.0);
    assert_eq!(matrix[[1, 0]], 4.0);
    assert_eq!(matrix[[1, 1]], 3.0);
}

#[test]
fn forecast_timestamps_are_three_hourly() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    let timestamps = FeatureEngineer::forecast_timestamps(now);
    assert_eq!(timestamps.len(), 17);
    for pair in timestamps.windows(2) {
        assert_eq!((pair[1] - pair[0]).num_hours(), 3);
    }
}
