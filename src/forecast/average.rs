//! Collapsing contributing points into one fused reading

use super::consensus::consensus;
use super::icons::{self, DESCRIPTION_PRIORITY, ICON_PRIORITY, IconSet, first_by_priority};
use crate::models::{AveragedForecast, ForecastPoint, SourceRange};
use chrono::{DateTime, Utc};

/// Mean of `values` rounded half up, matching how the providers' own
/// readings are rounded. `None` for an empty slice.
#[must_use]
pub fn rounded_mean(values: &[i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as i64;
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    // floor(sum / count + 1/2) in integer arithmetic
    let mean = (2 * sum + count).div_euclid(2 * count);
    i32::try_from(mean).ok()
}

/// Fuse `entries` into one reading stamped with `timestamp`
#[must_use]
pub fn average(
    entries: Vec<ForecastPoint>,
    timestamp: DateTime<Utc>,
    icon_set: &IconSet,
) -> AveragedForecast {
    let temperatures: Vec<i32> = entries.iter().map(|e| e.temperature).collect();

    let description = first_by_priority(&entries, &DESCRIPTION_PRIORITY, |e| {
        icons::description(e).map(str::to_string)
    })
    .unwrap_or_default();
    let icon_url =
        first_by_priority(&entries, &ICON_PRIORITY, |e| icon_set.icon_url(e)).unwrap_or_default();
    let precipitation = entries
        .first()
        .map(|e| e.precipitation.clone())
        .unwrap_or_default();

    AveragedForecast {
        timestamp,
        temperature: rounded_mean(&temperatures).unwrap_or_default(),
        description,
        icon_url,
        precipitation,
        low_temperature: temperatures.iter().min().copied(),
        high_temperature: temperatures.iter().max().copied(),
        consensus: consensus(&temperatures),
        source_ranges: source_ranges(&entries),
        entries,
    }
}

fn source_ranges(entries: &[ForecastPoint]) -> Vec<SourceRange> {
    let mut ranges: Vec<SourceRange> = Vec::new();
    for entry in entries {
        match ranges.iter_mut().find(|r| r.source == entry.source) {
            Some(range) => {
                range.min = range.min.min(entry.temperature);
                range.max = range.max.max(entry.temperature);
            }
            None => ranges.push(SourceRange {
                source: entry.source,
                min: entry.temperature,
                max: entry.temperature,
            }),
        }
    }
    ranges.sort_by_key(|r| r.source);
    ranges
}
