//! Geocoding endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use shared::Location;

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

/// GET /api/v1/geocode?q=<place>
///
/// Returns `null` for places the geocoder cannot resolve AND for upstream
/// failures: the dashboard treats both the same way, by asking the user for
/// coordinates instead.
pub async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> AppResult<Json<Option<Location>>> {
    let place = query.q.trim();
    if place.is_empty() {
        return Err(AppError::Validation {
            field: "q".to_string(),
            message: "query must not be empty".to_string(),
        });
    }

    let resolved = match state.geocoder.resolve(place).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(place, error = %e, "geocoding failed, treating as unresolved");
            None
        }
    };

    Ok(Json(resolved))
}
