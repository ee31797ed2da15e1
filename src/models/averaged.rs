//! Fused forecast records produced by the aggregator

use super::{ForecastPoint, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reading fused across every provider that had data for one slot or day.
///
/// Computed per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragedForecast {
    /// Timestamp of the first contributing point (bucket start for hour-keyed merges)
    pub timestamp: DateTime<Utc>,
    /// Rounded mean of the contributing temperatures
    pub temperature: i32,
    /// Text label from the highest-priority provider offering one, empty if none
    pub description: String,
    /// Icon from the highest-priority provider offering one, empty if none
    pub icon_url: String,
    /// Precipitation of the first contributing point
    pub precipitation: String,
    /// Contributing points in merge order
    pub entries: Vec<ForecastPoint>,
    pub low_temperature: Option<i32>,
    pub high_temperature: Option<i32>,
    /// Agreement between the contributing temperatures
    pub consensus: Consensus,
    /// Temperature band per contributing provider
    pub source_ranges: Vec<SourceRange>,
}

impl AveragedForecast {
    /// Providers that contributed, in canonical order, without duplicates
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        self.source_ranges.iter().map(|r| r.source).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    pub level: ConsensusLevel,
    /// Population standard deviation of the contributing temperatures, °C
    pub spread: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub source: Source,
    pub min: i32,
    pub max: i32,
}
