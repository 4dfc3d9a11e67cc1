//! Geocoding client for resolving place names to coordinates
//!
//! Uses a Nominatim-compatible search endpoint. Callers receive `Ok(None)`
//! for an unknown place; transport errors are mapped to `Ok(None)` with a
//! warning at the handler layer so a failed lookup never breaks the page.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use shared::Location;

/// Nominatim geocoding client
#[derive(Clone)]
pub struct GeocoderClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

/// One search result from the Nominatim API
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl GeocoderClient {
    pub fn new(client: Client, base_url: String, user_agent: String) -> Self {
        Self {
            client,
            base_url,
            user_agent,
        }
    }

    /// Resolve a free-text place name to a named location.
    ///
    /// Returns `Ok(None)` when the service has no match for the query.
    pub async fn resolve(&self, place: &str) -> AppResult<Option<Location>> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Geocoding service returned {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse geocoding response: {}", e))
        })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let latitude: f64 = place.lat.parse().map_err(|_| {
            AppError::ExternalService("Geocoding response had a malformed latitude".to_string())
        })?;
        let longitude: f64 = place.lon.parse().map_err(|_| {
            AppError::ExternalService("Geocoding response had a malformed longitude".to_string())
        })?;

        Ok(Some(Location::new(place.display_name, latitude, longitude)))
    }
}
