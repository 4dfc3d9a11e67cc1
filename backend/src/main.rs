//! Mframapa AI backend server

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mframapa_backend::external::geocoder::GeocoderClient;
use mframapa_backend::external::merra2::Merra2Client;
use mframapa_backend::external::tempo::TempoClient;
use mframapa_backend::external::weather::WeatherClient;
use mframapa_backend::external::build_http_client;
use mframapa_backend::routes::create_app;
use mframapa_backend::services::environment::EnvironmentalDataService;
use mframapa_backend::services::forecast::{ForecastService, ModelStore};
use mframapa_backend::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mframapa_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::load()?);
    info!(environment = %config.environment, "configuration loaded");

    let http = build_http_client(config.http.timeout_secs)?;

    let geocoder = Arc::new(GeocoderClient::new(
        http.clone(),
        config.geocoder.endpoint.clone(),
        config.geocoder.user_agent.clone(),
    ));
    let environment = EnvironmentalDataService::new(
        WeatherClient::new(
            http.clone(),
            config.weather.api_endpoint.clone(),
            config.weather.api_key.clone(),
        ),
        Merra2Client::new(
            http.clone(),
            config.earthdata.merra2_endpoint.clone(),
            config.earthdata.username.clone(),
            config.earthdata.password.clone(),
        ),
        TempoClient::new(
            http,
            config.earthdata.tempo_endpoint.clone(),
            config.earthdata.username.clone(),
            config.earthdata.password.clone(),
        ),
        Duration::from_secs(config.cache.weather_ttl_secs),
        Duration::from_secs(config.cache.satellite_ttl_secs),
    );

    // The server starts without models; the forecast endpoint answers 503
    // until the training pipeline has produced artifacts.
    let store = match ModelStore::load(Path::new(&config.models.dir)) {
        Ok(store) => Some(store),
        Err(e) => {
            error!(error = %e, dir = %config.models.dir, "starting without trained models");
            None
        }
    };
    let forecast = Arc::new(ForecastService::new(
        environment,
        store,
        Duration::from_secs(config.cache.forecast_ttl_secs),
    ));

    let state = AppState {
        config: config.clone(),
        geocoder,
        forecast,
    };
    let app = create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
