//! Forecast endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::{advise, ForecastPoint, HealthAdvisory, Location, UserProfile};

use crate::error::AppResult;
use crate::handlers::validate_request;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ForecastRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within [-90, 90]"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must be within [-180, 180]"
    ))]
    pub longitude: f64,

    /// Display name for the location; coordinates are used when absent
    pub name: Option<String>,

    /// Optional health profile for personalized advice
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub location: Location,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ForecastPoint>,
    /// Advice for current conditions (the first forecast point)
    pub advisory: HealthAdvisory,
}

/// POST /api/v1/forecast
pub async fn get_forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> AppResult<Json<ForecastResponse>> {
    validate_request(&request)?;

    let name = request.name.unwrap_or_else(|| {
        format!("{:.4}, {:.4}", request.latitude, request.longitude)
    });
    let location = Location::new(name, request.latitude, request.longitude);

    let points = state.forecast.forecast(&location).await?;
    let current_aqi = points.first().map(|p| p.aqi.overall).unwrap_or(0);
    let advisory = advise(current_aqi, request.profile.as_ref());

    Ok(Json(ForecastResponse {
        location,
        generated_at: Utc::now(),
        points,
        advisory,
    }))
}
