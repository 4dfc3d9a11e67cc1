//! External API clients
//!
//! Each client normalizes a third-party response into the flat values the
//! feature engineer needs. Clients return `AppResult` and never apply
//! fallback values themselves — that contract lives in one place, the
//! environment service.

pub mod geocoder;
pub mod merra2;
pub mod tempo;
pub mod weather;

use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Build the shared outbound HTTP client. Every external fetch carries this
/// timeout so a stalled upstream degrades to fallbacks instead of hanging a
/// forecast request.
pub fn build_http_client(timeout_secs: u64) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}
