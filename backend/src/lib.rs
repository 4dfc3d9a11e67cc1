//! Mframapa AI backend
//!
//! Air-quality forecasting service: environmental data fetchers with
//! guaranteed fallbacks, shared feature engineering, gradient-boosted
//! regression models, the offline training pipeline, and the HTTP surface
//! the dashboard calls.

use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod ml;
pub mod routes;
pub mod services;

pub use config::Config;

use external::geocoder::GeocoderClient;
use services::forecast::ForecastService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub geocoder: Arc<GeocoderClient>,
    pub forecast: Arc<ForecastService>,
}
