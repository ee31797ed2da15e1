//! Normalized per-source forecast records and the per-source series mapping

use super::Source;
use crate::{Result, VaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// One provider's reading for one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Provider that produced this point
    pub source: Source,
    /// Absolute instant this reading applies to
    pub timestamp: DateTime<Utc>,
    /// Provider description: a text label (OWM, TV2) or a symbol code (DMI, YR)
    pub description: String,
    /// Temperature in Celsius, rounded
    pub temperature: i32,
    /// Free-form, unit-qualified precipitation or "N/A"
    pub precipitation: String,
}

impl ForecastPoint {
    #[must_use]
    pub fn new(
        source: Source,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
        temperature: i32,
        precipitation: impl Into<String>,
    ) -> Self {
        Self {
            source,
            timestamp,
            description: description.into(),
            temperature,
            precipitation: precipitation.into(),
        }
    }
}

/// Forecast lists keyed by provider.
///
/// Every configured provider has a list, possibly empty when its fetch
/// failed. Lists are kept in ascending timestamp order. On the wire this is a
/// plain object (`{"tv2": [...], "dmi": null, ...}`); `null` reads as empty.
/// A point whose `source` differs from the key of its list is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Source, Option<Vec<ForecastPoint>>>",
    into = "BTreeMap<Source, Vec<ForecastPoint>>"
)]
pub struct ForecastSeries {
    lists: BTreeMap<Source, Vec<ForecastPoint>>,
}

impl ForecastSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Series with an empty list for every known provider
    #[must_use]
    pub fn with_sources(sources: &[Source]) -> Self {
        let lists = sources.iter().map(|s| (*s, Vec::new())).collect();
        Self { lists }
    }

    /// Sets the list for `source`, sorting it by timestamp (stable).
    ///
    /// Points labelled with another source are dropped.
    pub fn insert(&mut self, source: Source, mut points: Vec<ForecastPoint>) {
        let before = points.len();
        points.retain(|p| p.source == source);
        if points.len() < before {
            warn!(
                %source,
                dropped = before - points.len(),
                "Dropped points labelled with another source"
            );
        }
        points.sort_by_key(|p| p.timestamp);
        self.lists.insert(source, points);
    }

    /// Read a captured series from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| VaError::general(format!("Invalid forecast series in {}: {e}", path.display())))
    }

    /// Builder-style [`Self::insert`]
    #[must_use]
    pub fn with(mut self, source: Source, points: Vec<ForecastPoint>) -> Self {
        self.insert(source, points);
        self
    }

    #[must_use]
    pub fn get(&self, source: Source) -> &[ForecastPoint] {
        self.lists.get(&source).map_or(&[], Vec::as_slice)
    }

    /// Number of configured providers, including ones with an empty list
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.lists.len()
    }

    /// True when no provider has any data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }

    /// All lists in canonical source order
    pub fn iter(&self) -> impl Iterator<Item = (Source, &[ForecastPoint])> {
        self.lists.iter().map(|(s, l)| (*s, l.as_slice()))
    }

    /// Non-empty lists in canonical source order
    pub fn non_empty(&self) -> impl Iterator<Item = (Source, &[ForecastPoint])> {
        self.iter().filter(|(_, l)| !l.is_empty())
    }

    /// Length of the shortest non-empty list, 0 when all are empty
    #[must_use]
    pub fn shortest_len(&self) -> usize {
        self.non_empty().map(|(_, l)| l.len()).min().unwrap_or(0)
    }

    /// Length of the longest non-empty list, 0 when all are empty
    #[must_use]
    pub fn longest_len(&self) -> usize {
        self.non_empty().map(|(_, l)| l.len()).max().unwrap_or(0)
    }
}

impl TryFrom<BTreeMap<Source, Option<Vec<ForecastPoint>>>> for ForecastSeries {
    type Error = VaError;

    fn try_from(raw: BTreeMap<Source, Option<Vec<ForecastPoint>>>) -> Result<Self> {
        let mut series = ForecastSeries::new();
        for (source, points) in raw {
            let points = points.unwrap_or_default();
            if let Some(stray) = points.iter().find(|p| p.source != source) {
                return Err(VaError::parse(
                    source,
                    format!("point at {} is labelled '{}'", stray.timestamp, stray.source),
                ));
            }
            series.insert(source, points);
        }
        Ok(series)
    }
}

impl From<ForecastSeries> for BTreeMap<Source, Vec<ForecastPoint>> {
    fn from(series: ForecastSeries) -> Self {
        series.lists
    }
}
