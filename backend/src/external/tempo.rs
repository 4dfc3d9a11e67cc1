//! TEMPO satellite trace-gas client
//!
//! TEMPO is a geostationary instrument covering North America only, so the
//! client checks the query region against the instrument envelope before
//! touching the network. Outside coverage it reports "no data" without an
//! error, since that is an expected condition for most of the world.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use shared::{BoundingBox, DateRange};

use crate::error::{AppError, AppResult};

/// TEMPO field-of-regard envelope (approximate North America)
pub const TEMPO_COVERAGE: BoundingBox = BoundingBox {
    min_lon: -170.0,
    min_lat: 15.0,
    max_lon: -50.0,
    max_lat: 75.0,
};

/// Granules averaged per query
const MAX_GRANULES: usize = 5;

/// Column NO2 measurement averaged over the matched granules
#[derive(Debug, Clone, PartialEq)]
pub struct TraceGas {
    pub no2_column: f64,
    pub no2_uncertainty: f64,
}

/// TEMPO satellite data client
#[derive(Clone)]
pub struct TempoClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct TempoResponse {
    granules: Vec<TempoGranule>,
}

#[derive(Debug, Deserialize)]
struct TempoGranule {
    no2_column: f64,
    no2_uncertainty: f64,
}

impl TempoClient {
    pub fn new(client: Client, base_url: String, username: String, password: String) -> Self {
        Self {
            client,
            base_url,
            username,
            password,
        }
    }

    /// Fetch averaged column NO2 for a region and date range.
    ///
    /// `Ok(None)` means the region is outside coverage or no granules matched;
    /// only transport and parse failures are errors.
    pub async fn fetch(&self, region: &BoundingBox, range: &DateRange) -> AppResult<Option<TraceGas>> {
        if !TEMPO_COVERAGE.encloses(region) {
            debug!(
                min_lon = region.min_lon,
                min_lat = region.min_lat,
                "region outside TEMPO coverage, skipping query"
            );
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.base_url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("bbox", region.to_query_string()),
                ("start", range.start.to_string()),
                ("end", range.end.to_string()),
                ("limit", MAX_GRANULES.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("TEMPO request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "TEMPO service returned {}",
                response.status()
            )));
        }

        let data: TempoResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse TEMPO response: {}", e))
        })?;

        let granules: Vec<&TempoGranule> = data
            .granules
            .iter()
            .take(MAX_GRANULES)
            .filter(|g| g.no2_column.is_finite())
            .collect();

        if granules.is_empty() {
            return Ok(None);
        }

        let n = granules.len() as f64;
        Ok(Some(TraceGas {
            no2_column: granules.iter().map(|g| g.no2_column).sum::<f64>() / n,
            no2_uncertainty: granules.iter().map(|g| g.no2_uncertainty).sum::<f64>() / n,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::GeoPoint;

    #[test]
    fn accra_is_outside_tempo_coverage() {
        let accra = GeoPoint::new(5.6037, -0.187);
        let region = BoundingBox::around(accra, 0.5);
        assert!(!TEMPO_COVERAGE.encloses(&region));
    }

    #[test]
    fn los_angeles_is_inside_tempo_coverage() {
        let la = GeoPoint::new(34.05, -118.24);
        let region = BoundingBox::around(la, 0.5);
        assert!(TEMPO_COVERAGE.encloses(&region));
    }
}
