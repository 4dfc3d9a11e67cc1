//! Domain models for the Mframapa AI forecasting system

mod forecast;
mod location;
mod profile;

pub use forecast::*;
pub use location::*;
pub use profile::*;
