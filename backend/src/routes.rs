//! API route definitions

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{advisory, forecast, geocode};
use crate::AppState;

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/forecast", post(forecast::get_forecast))
        .route("/geocode", get(geocode::geocode))
        .route("/advisory", post(advisory::get_advisory));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Mframapa AI",
        "description": "Air quality forecasting API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "models_loaded": state.forecast.models_loaded(),
    }))
}
