//! `va` - Multi-source weather forecast aggregator
//!
//! Collects forecasts for Danish cities from several providers, normalizes
//! them into a common point format and fuses them into hourly and daily views.

pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod service;
pub mod weather;

// Re-export core types for public API
pub use cache::{ForecastCache, MemoryCache, PersistentCache};
pub use config::VaConfig;
pub use error::VaError;
pub use forecast::{Aggregator, IconSet, MergeStrategy, compute_daily, compute_hourly};
pub use models::{AveragedForecast, City, ForecastPoint, ForecastSeries, Source};
pub use service::{ForecastReport, Outage, SourceStatus, WeatherService};
pub use weather::ForecastProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, VaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
