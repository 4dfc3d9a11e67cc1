//! Resolved location models

use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// A geocoded location. Immutable once resolved; its rounded coordinates
/// serve as the cache key for fetcher and forecast caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Cache key: coordinates rounded to ~11 m so nearby queries share
    /// fetched data and forecasts.
    pub fn cache_key(&self) -> (i64, i64) {
        (
            (self.latitude * 1e4).round() as i64,
            (self.longitude * 1e4).round() as i64,
        )
    }
}
