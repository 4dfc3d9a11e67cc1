//! Offline training CLI
//!
//! Reads measurement CSVs, trains one gradient-boosted model per pollutant
//! and writes the artifacts the server loads at startup.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mframapa_backend::external::build_http_client;
use mframapa_backend::external::merra2::Merra2Client;
use mframapa_backend::external::tempo::TempoClient;
use mframapa_backend::external::weather::WeatherClient;
use mframapa_backend::ml::GbmConfig;
use mframapa_backend::services::environment::EnvironmentalDataService;
use mframapa_backend::services::training::TrainingPipeline;
use mframapa_backend::Config;

#[derive(Parser, Debug)]
#[command(name = "mframapa-train", about = "Train air quality forecasting models")]
struct Args {
    /// Directory of measurement CSVs
    #[arg(long, default_value = "training_data")]
    data_dir: String,

    /// Output directory for model artifacts
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Random seed for subsampling and the train/test split
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Join live environmental data into the training features
    #[arg(long)]
    with_environment: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mframapa_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = GbmConfig {
        seed: args.seed,
        ..Default::default()
    };
    let mut pipeline = TrainingPipeline::new(&args.data_dir, &args.models_dir, config);

    if args.with_environment {
        let app_config = Config::load()?;
        let http = build_http_client(app_config.http.timeout_secs)?;
        let environment = EnvironmentalDataService::new(
            WeatherClient::new(
                http.clone(),
                app_config.weather.api_endpoint.clone(),
                app_config.weather.api_key.clone(),
            ),
            Merra2Client::new(
                http.clone(),
                app_config.earthdata.merra2_endpoint.clone(),
                app_config.earthdata.username.clone(),
                app_config.earthdata.password.clone(),
            ),
            TempoClient::new(
                http,
                app_config.earthdata.tempo_endpoint.clone(),
                app_config.earthdata.username,
                app_config.earthdata.password,
            ),
            Duration::from_secs(app_config.cache.weather_ttl_secs),
            Duration::from_secs(app_config.cache.satellite_ttl_secs),
        );
        pipeline = pipeline.with_environment(environment);
    }

    let report = pipeline.run().await?;
    println!("{}", report);

    Ok(())
}
