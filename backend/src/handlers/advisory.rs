//! Health advisory endpoint

use axum::Json;
use serde::Deserialize;
use validator::Validate;

use shared::{advise, HealthAdvisory, UserProfile};

use crate::error::AppResult;
use crate::handlers::validate_request;

#[derive(Debug, Deserialize, Validate)]
pub struct AdvisoryRequest {
    #[validate(range(max = 500, message = "aqi must be within [0, 500]"))]
    pub aqi: u16,

    pub profile: Option<UserProfile>,
}

/// POST /api/v1/advisory
///
/// Pure mapping from an AQI value and an optional health profile to advice;
/// no state, no external calls.
pub async fn get_advisory(
    Json(request): Json<AdvisoryRequest>,
) -> AppResult<Json<HealthAdvisory>> {
    validate_request(&request)?;
    Ok(Json(advise(request.aqi, request.profile.as_ref())))
}
