//! US EPA Air Quality Index conversion
//!
//! Piecewise-linear breakpoint interpolation from raw pollutant
//! concentrations to the 0-500 AQI scale, plus the category/color table.
//! The breakpoint values are the EPA standard tables; shifting them moves
//! every downstream category boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Pollutant;

/// Breakpoint table: (concentration, index) pairs, strictly increasing in
/// both fields. Concentrations above the last entry clamp to 500.
type Breakpoints = [(f64, f64); 7];

/// PM2.5 in μg/m³ (24-hour)
const PM25_BREAKPOINTS: Breakpoints = [
    (0.0, 0.0),
    (12.0, 50.0),
    (35.4, 100.0),
    (55.4, 150.0),
    (150.4, 200.0),
    (250.4, 300.0),
    (500.4, 500.0),
];

/// O3 in ppb (8-hour)
const O3_BREAKPOINTS: Breakpoints = [
    (0.0, 0.0),
    (54.0, 50.0),
    (70.0, 100.0),
    (85.0, 150.0),
    (105.0, 200.0),
    (200.0, 300.0),
    (300.0, 500.0),
];

/// NO2 in ppb (1-hour)
const NO2_BREAKPOINTS: Breakpoints = [
    (0.0, 0.0),
    (53.0, 50.0),
    (100.0, 100.0),
    (360.0, 150.0),
    (649.0, 200.0),
    (1249.0, 300.0),
    (2049.0, 500.0),
];

fn breakpoints(pollutant: Pollutant) -> &'static Breakpoints {
    match pollutant {
        Pollutant::Pm25 => &PM25_BREAKPOINTS,
        Pollutant::O3 => &O3_BREAKPOINTS,
        Pollutant::No2 => &NO2_BREAKPOINTS,
    }
}

/// Convert a concentration to the AQI for one pollutant.
///
/// Total over `[0, ∞)`: negative input is treated as 0, anything above the
/// top breakpoint is the Hazardous ceiling of 500.
pub fn aqi_for(pollutant: Pollutant, concentration: f64) -> u16 {
    let table = breakpoints(pollutant);
    let c = if concentration.is_finite() {
        concentration.max(0.0)
    } else {
        0.0
    };

    for window in table.windows(2) {
        let (c_lo, i_lo) = window[0];
        let (c_hi, i_hi) = window[1];
        if c >= c_lo && c <= c_hi {
            let index = (i_hi - i_lo) / (c_hi - c_lo) * (c - c_lo) + i_lo;
            return index.round() as u16;
        }
    }

    // Above the highest breakpoint
    500
}

/// AQI readings for a set of pollutant concentrations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AqiSummary {
    /// Per-pollutant index values
    pub by_pollutant: BTreeMap<Pollutant, u16>,
    /// EPA convention: the worst pollutant dominates (0 when empty)
    pub overall: u16,
    /// Which pollutant drove the overall value, for UI attribution
    pub dominant: Option<Pollutant>,
}

/// Compute per-pollutant AQIs and the overall (maximum) index.
pub fn overall_aqi(concentrations: &BTreeMap<Pollutant, f64>) -> AqiSummary {
    let by_pollutant: BTreeMap<Pollutant, u16> = concentrations
        .iter()
        .map(|(&pollutant, &value)| (pollutant, aqi_for(pollutant, value)))
        .collect();

    let dominant = by_pollutant
        .iter()
        .max_by_key(|(_, &index)| index)
        .map(|(&pollutant, _)| pollutant);
    let overall = dominant.map_or(0, |p| by_pollutant[&p]);

    AqiSummary {
        by_pollutant,
        overall,
        dominant,
    }
}

/// EPA AQI categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: u16) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Standard EPA display color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00E400",
            AqiCategory::Moderate => "#FFFF00",
            AqiCategory::UnhealthyForSensitiveGroups => "#FF7E00",
            AqiCategory::Unhealthy => "#FF0000",
            AqiCategory::VeryUnhealthy => "#8F3F97",
            AqiCategory::Hazardous => "#7E0023",
        }
    }
}

impl std::fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
