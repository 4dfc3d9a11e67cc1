//! Environmental data acquisition with guaranteed fallbacks
//!
//! The single place where the fallback contract is enforced: every fetch
//! method on this service is total. Upstream failures are logged and replaced
//! with documented default values, so a forecast can always be assembled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::warn;

use shared::{
    BoundingBox, DateRange, GeoPoint, FORECAST_HORIZON_HOURS, FORECAST_STEP_HOURS,
};

use crate::cache::TtlCache;
use crate::external::merra2::{Merra2Client, MERRA2_VARIABLES};
use crate::external::tempo::TempoClient;
use crate::external::weather::{WeatherClient, WeatherPoint, WeatherSeries};

/// Cache key: coordinates rounded to 4 decimal places (~11 m)
fn coord_key(latitude: f64, longitude: f64) -> (i64, i64) {
    (
        (latitude * 1e4).round() as i64,
        (longitude * 1e4).round() as i64,
    )
}

/// Everything the feature engineer needs for one location
#[derive(Debug, Clone)]
pub struct EnvironmentalSnapshot {
    /// 3-hourly weather series covering the forecast horizon
    pub weather: WeatherSeries,
    /// Mean reanalysis value per variable
    pub reanalysis: BTreeMap<String, f64>,
    /// Column trace-gas values (NO2_column, NO2_uncertainty)
    pub trace_gas: BTreeMap<String, f64>,
}

/// Environmental data service with per-source TTL caches
pub struct EnvironmentalDataService {
    weather_client: WeatherClient,
    merra2_client: Merra2Client,
    tempo_client: TempoClient,
    weather_cache: TtlCache<(i64, i64), WeatherSeries>,
    reanalysis_cache: TtlCache<(i64, i64), BTreeMap<String, f64>>,
    trace_gas_cache: TtlCache<(i64, i64), BTreeMap<String, f64>>,
}

impl EnvironmentalDataService {
    pub fn new(
        weather_client: WeatherClient,
        merra2_client: Merra2Client,
        tempo_client: TempoClient,
        weather_ttl: Duration,
        satellite_ttl: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            weather_client,
            merra2_client,
            tempo_client,
            weather_cache: TtlCache::new(weather_ttl),
            reanalysis_cache: TtlCache::new(satellite_ttl),
            trace_gas_cache: TtlCache::new(satellite_ttl),
        })
    }

    /// Fetch all three sources for a location. Never fails.
    pub async fn snapshot(&self, point: GeoPoint) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            weather: self.weather(point).await,
            reanalysis: self.reanalysis(point).await,
            trace_gas: self.trace_gas(point).await,
        }
    }

    /// Weather forecast series, falling back to a flat default series.
    pub async fn weather(&self, point: GeoPoint) -> WeatherSeries {
        let key = coord_key(point.latitude, point.longitude);
        if let Some(series) = self.weather_cache.get(&key) {
            return series;
        }

        let series = match self
            .weather_client
            .fetch(point.latitude, point.longitude)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    latitude = point.latitude,
                    longitude = point.longitude,
                    error = %e,
                    "weather fetch failed, using fallback series"
                );
                fallback_weather_series()
            }
        };

        self.weather_cache.insert(key, series.clone());
        series
    }

    /// Mean reanalysis values, gap-filled to the full variable set.
    pub async fn reanalysis(&self, point: GeoPoint) -> BTreeMap<String, f64> {
        let key = coord_key(point.latitude, point.longitude);
        if let Some(values) = self.reanalysis_cache.get(&key) {
            return values;
        }

        let range = recent_range(7);
        let mut values = match self
            .merra2_client
            .fetch(point.latitude, point.longitude, &range)
            .await
        {
            Ok(values) => values,
            Err(e) => {
                warn!(
                    latitude = point.latitude,
                    longitude = point.longitude,
                    error = %e,
                    "reanalysis fetch failed, using fallback values"
                );
                BTreeMap::new()
            }
        };

        // Fill whatever the upstream omitted so every variable is present.
        for variable in MERRA2_VARIABLES {
            values
                .entry(variable.to_string())
                .or_insert_with(|| reanalysis_fallback(variable));
        }

        self.reanalysis_cache.insert(key, values.clone());
        values
    }

    /// Column trace-gas values. Outside instrument coverage and on failure
    /// the same zero fallback applies.
    pub async fn trace_gas(&self, point: GeoPoint) -> BTreeMap<String, f64> {
        let key = coord_key(point.latitude, point.longitude);
        if let Some(values) = self.trace_gas_cache.get(&key) {
            return values;
        }

        let region = BoundingBox::around(point, 0.5);
        let range = recent_range(3);
        let values = match self.tempo_client.fetch(&region, &range).await {
            Ok(Some(gas)) => {
                let mut m = BTreeMap::new();
                m.insert("NO2_column".to_string(), gas.no2_column);
                m.insert("NO2_uncertainty".to_string(), gas.no2_uncertainty);
                m
            }
            Ok(None) => fallback_trace_gas(),
            Err(e) => {
                warn!(
                    latitude = point.latitude,
                    longitude = point.longitude,
                    error = %e,
                    "trace-gas fetch failed, using fallback values"
                );
                fallback_trace_gas()
            }
        };

        self.trace_gas_cache.insert(key, values.clone());
        values
    }
}

fn recent_range(days: i64) -> DateRange {
    let today = Utc::now().date_naive();
    DateRange::new(today - ChronoDuration::days(days), today)
}

/// Flat 3-hourly series of moderate mid-latitude conditions covering the
/// forecast horizon.
pub fn fallback_weather_series() -> WeatherSeries {
    let now = Utc::now();
    (0..=FORECAST_HORIZON_HOURS / FORECAST_STEP_HOURS)
        .map(|step| WeatherPoint {
            timestamp: now + ChronoDuration::hours(step * FORECAST_STEP_HOURS),
            temperature: 25.0,
            humidity: 60.0,
            pressure: 1013.0,
            wind_speed: 2.0,
            wind_direction: 0.0,
            cloud_cover: 50.0,
        })
        .collect()
}

/// Default value per reanalysis variable: zero aerosol load, 20 °C, near-dry
/// air, calm winds, a 1 km boundary layer and half cloud cover.
pub fn reanalysis_fallback(variable: &str) -> f64 {
    match variable {
        "T2M" => 20.0,
        "RH2M" => 0.01,
        "PBLH" => 1000.0,
        "CLDFRC" => 0.5,
        _ => 0.0,
    }
}

/// Clean-column default used when no trace-gas data exists.
pub fn fallback_trace_gas() -> BTreeMap<String, f64> {
    let mut m = BTreeMap::new();
    m.insert("NO2_column".to_string(), 0.0);
    m.insert("NO2_uncertainty".to_string(), 0.0);
    m
}
