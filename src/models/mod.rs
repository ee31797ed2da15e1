//! Data models for the va aggregator
//!
//! This module contains the core domain models organized by concern:
//! - Source: the weather providers and their canonical order
//! - City: supported locations and provider identifiers
//! - Forecast: normalized per-source points and the series mapping
//! - Averaged: fused hourly/daily records
//! - Sun: sunrise and sunset times

pub mod averaged;
pub mod city;
pub mod forecast;
pub mod source;
pub mod sun;

// Re-export all public types for convenient access
pub use averaged::{AveragedForecast, Consensus, ConsensusLevel, SourceRange};
pub use city::City;
pub use forecast::{ForecastPoint, ForecastSeries};
pub use source::Source;
pub use sun::{SunData, SunTimes};
