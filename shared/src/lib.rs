//! Shared types and domain logic for Mframapa AI
//!
//! This crate contains the types and pure computations shared between the
//! backend, the offline training pipeline, and any frontend of the
//! air-quality forecasting system: pollutant and location models, the EPA
//! AQI conversion, and the health-advice mapping. Nothing in here performs
//! I/O or holds state.

pub mod advisory;
pub mod aqi;
pub mod models;
pub mod types;

pub use advisory::*;
pub use aqi::*;
pub use models::*;
pub use types::*;
