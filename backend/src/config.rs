//! Configuration management for the Mframapa AI backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MFRAMAPA_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Trained model artifact configuration
    pub models: ModelsConfig,

    /// Outbound HTTP configuration
    pub http: HttpConfig,

    /// Geocoding service configuration
    pub geocoder: GeocoderConfig,

    /// Weather forecast API configuration
    pub weather: WeatherConfig,

    /// NASA Earthdata configuration (reanalysis + trace-gas sources)
    pub earthdata: EarthdataConfig,

    /// Cache TTL configuration
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding serialized models and feature metadata
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Timeout applied to every external fetch; on expiry the fetchers
    /// fall back to defaults rather than hang a forecast request.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    /// Nominatim-compatible endpoint
    pub endpoint: String,

    /// User-Agent sent with geocoding requests (required by Nominatim)
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthdataConfig {
    /// Reanalysis (MERRA-2) time-series endpoint
    pub merra2_endpoint: String,

    /// Trace-gas (TEMPO) column endpoint
    pub tempo_endpoint: String,

    /// Earthdata username (empty disables authenticated fetches and the
    /// fallback contract takes over)
    pub username: String,

    /// Earthdata password
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Weather forecast cache TTL in seconds
    pub weather_ttl_secs: u64,

    /// Satellite (reanalysis/trace-gas) cache TTL in seconds
    pub satellite_ttl_secs: u64,

    /// Assembled forecast cache TTL in seconds
    pub forecast_ttl_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("MFRAMAPA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("models.dir", "models")?
            .set_default("http.timeout_secs", 10)?
            .set_default("geocoder.endpoint", "https://nominatim.openstreetmap.org")?
            .set_default("geocoder.user_agent", "mframapa_ai")?
            .set_default(
                "weather.api_endpoint",
                "https://api.openweathermap.org/data/2.5",
            )?
            .set_default("weather.api_key", "")?
            .set_default(
                "earthdata.merra2_endpoint",
                "https://goldsmr4.gesdisc.eosdis.nasa.gov/timeseries",
            )?
            .set_default(
                "earthdata.tempo_endpoint",
                "https://asdc.larc.nasa.gov/tempo/no2",
            )?
            .set_default("earthdata.username", "")?
            .set_default("earthdata.password", "")?
            .set_default("cache.weather_ttl_secs", 1800)?
            .set_default("cache.satellite_ttl_secs", 3600)?
            .set_default("cache.forecast_ttl_secs", 1800)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MFRAMAPA_ prefix)
            .add_source(
                Environment::with_prefix("MFRAMAPA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
