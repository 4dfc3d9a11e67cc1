//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Geographic bounding box as (min_lon, min_lat, max_lon, max_lat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Box of `half_width` degrees in each direction around a point
    pub fn around(point: GeoPoint, half_width: f64) -> Self {
        Self {
            min_lon: point.longitude - half_width,
            min_lat: point.latitude - half_width,
            max_lon: point.longitude + half_width,
            max_lat: point.latitude + half_width,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
            && point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
    }

    /// Whether `other` lies entirely inside this box
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
            && other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
    }

    /// Comma-separated `min_lon,min_lat,max_lon,max_lat` form used in queries
    pub fn to_query_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Pollutants covered by the forecasting models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Pm25,
    O3,
    No2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 3] = [Pollutant::Pm25, Pollutant::O3, Pollutant::No2];

    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
        }
    }

    /// Measurement unit for concentrations of this pollutant
    pub fn unit(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "μg/m³",
            Pollutant::O3 => "ppb",
            Pollutant::No2 => "ppb",
        }
    }

    /// Filename stem used for persisted model artifacts
    pub fn file_stem(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
        }
    }

    /// Parse a pollutant from a ground-truth parameter name.
    ///
    /// Accepts the canonical names as well as the EPA AQS parameter labels
    /// found in the daily summary CSVs ("Ozone", "Nitrogen dioxide (NO2)",
    /// "PM2.5 - Local Conditions", "Acceptable PM2.5 AQI & Speciation Mass").
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        if lowered.contains("pm2.5") || lowered == "pm25" {
            Some(Pollutant::Pm25)
        } else if lowered == "o3" || lowered.contains("ozone") {
            Some(Pollutant::O3)
        } else if lowered == "no2" || lowered.contains("nitrogen dioxide") {
            Some(Pollutant::No2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Date range for data queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    pub fn new(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day range
    pub fn day(date: chrono::NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}
