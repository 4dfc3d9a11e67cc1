//! Weather forecast API client
//!
//! Integrates with the OpenWeatherMap 5-day/3-hour forecast endpoint and
//! normalizes the response into a flat time-indexed series of the six
//! meteorological values the feature engineer consumes.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// One ~3-hourly forecast step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherPoint {
    pub timestamp: DateTime<Utc>,
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Cloud cover in percent
    pub cloud_cover: f64,
}

/// Time-indexed weather forecast series
pub type WeatherSeries = Vec<WeatherPoint>;

/// OpenWeatherMap forecast response
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    wind: OwmWind,
    clouds: OwmClouds,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmClouds {
    all: f64,
}

impl WeatherClient {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Fetch the 3-hourly forecast series for a location
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> AppResult<WeatherSeries> {
        if self.api_key.is_empty() {
            return Err(AppError::ExternalService(
                "Weather API key is not configured".to_string(),
            ));
        }

        let url = format!("{}/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Weather API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Weather API returned {}",
                response.status()
            )));
        }

        let data: OwmForecastResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse weather response: {}", e))
        })?;

        if data.list.is_empty() {
            return Err(AppError::ExternalService(
                "Weather API returned an empty forecast".to_string(),
            ));
        }

        Ok(data
            .list
            .into_iter()
            .map(|item| WeatherPoint {
                timestamp: DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now),
                temperature: item.main.temp,
                humidity: item.main.humidity,
                pressure: item.main.pressure,
                wind_speed: item.wind.speed,
                wind_direction: item.wind.deg.unwrap_or(0.0),
                cloud_cover: item.clouds.all,
            })
            .collect())
    }
}
