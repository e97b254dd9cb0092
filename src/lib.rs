//! `astroforecast` - astronomy-oriented weather forecasts
//!
//! Normalizes raw forecasts from several weather providers into one hourly
//! record, derives seeing, transparency and a lifted-index proxy, scores each
//! hour for observing and merges in twilight and moon events of every day.

pub mod config;
pub mod ephemeris;
pub mod error;
pub mod estimator;
pub mod forecast_service;
pub mod models;
pub mod scoring;
pub mod weather;

// Re-export core types for public API
pub use config::AstroForecastConfig;
pub use error::AstroForecastError;
pub use estimator::Estimator;
pub use forecast_service::{ForecastService, ForecastSource};
pub use models::{AstronomicalDay, Forecast, HourlyRecord, Location};
pub use scoring::{ConditionScore, ConditionWeights, WeatherType};
pub use weather::{ProviderKind, RawPayload};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AstroForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
