//! Business logic services

pub mod environment;
pub mod features;
pub mod forecast;
pub mod training;

pub use environment::EnvironmentalDataService;
pub use features::FeatureEngineer;
pub use forecast::ForecastService;
pub use training::TrainingPipeline;
