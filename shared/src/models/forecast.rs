//! Forecast output models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aqi::AqiSummary;
use crate::types::Pollutant;

/// Forecast horizon: 48 hours ahead in 3-hour steps (17 points, t=0 first)
pub const FORECAST_HORIZON_HOURS: i64 = 48;
pub const FORECAST_STEP_HOURS: i64 = 3;
pub const FORECAST_POINTS: usize = 17;

/// One forecast timestep: predicted concentrations and their AQI readings.
/// Ephemeral — recomputed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    /// Predicted concentration per pollutant, in each pollutant's unit
    pub concentrations: BTreeMap<Pollutant, f64>,
    pub aqi: AqiSummary,
}
