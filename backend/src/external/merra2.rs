//! MERRA-2 reanalysis client
//!
//! Pulls aerosol and meteorology variables from a NASA Earthdata subsetting
//! service and collapses each variable's time series to a mean value for the
//! requested window.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;

use shared::DateRange;

use crate::error::{AppError, AppResult};

/// Variables requested from the reanalysis service, in fixed order.
/// The first five are aerosol mass concentrations, the rest standard
/// near-surface meteorology.
pub const MERRA2_VARIABLES: [&str; 11] = [
    "BCSMASS", "OCSMASS", "DUSMASS", "SSSMASS", "SO4SMASS", "T2M", "RH2M", "U2M", "V2M", "PBLH",
    "CLDFRC",
];

/// MERRA-2 reanalysis API client
#[derive(Clone)]
pub struct Merra2Client {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct Merra2Response {
    data: BTreeMap<String, Vec<f64>>,
}

impl Merra2Client {
    pub fn new(client: Client, base_url: String, username: String, password: String) -> Self {
        Self {
            client,
            base_url,
            username,
            password,
        }
    }

    /// Fetch the requested variables at a point, averaged over the date range.
    ///
    /// Returns one mean value per variable present in the response. Variables
    /// the service omits are simply absent from the map; the caller is
    /// responsible for filling gaps.
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        range: &DateRange,
    ) -> AppResult<BTreeMap<String, f64>> {
        let response = self
            .client
            .get(&self.base_url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("start", range.start.to_string()),
                ("end", range.end.to_string()),
                ("variables", MERRA2_VARIABLES.join(",")),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("MERRA-2 request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "MERRA-2 service returned {}",
                response.status()
            )));
        }

        let data: Merra2Response = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse MERRA-2 response: {}", e))
        })?;

        let mut averaged = BTreeMap::new();
        for (variable, values) in data.data {
            let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
            if !finite.is_empty() {
                let mean = finite.iter().sum::<f64>() / finite.len() as f64;
                averaged.insert(variable, mean);
            }
        }

        if averaged.is_empty() {
            return Err(AppError::ExternalService(
                "MERRA-2 response contained no usable values".to_string(),
            ));
        }

        Ok(averaged)
    }
}
