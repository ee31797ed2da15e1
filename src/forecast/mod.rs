//! Forecast aggregation
//!
//! Fuses the per-provider lists of a [`ForecastSeries`] into an hourly view
//! and a daily view. Everything here is pure: no I/O, no shared state, and
//! all-empty input simply yields empty views.

pub mod average;
pub mod consensus;
pub mod icons;

use crate::models::{AveragedForecast, ForecastPoint, ForecastSeries};
use average::average;
use chrono::{DateTime, DurationRound, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
pub use icons::IconSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum number of hourly slots returned
pub const HOURLY_LIMIT: usize = 25;
/// Maximum number of days returned
pub const DAILY_LIMIT: usize = 10;

/// How hourly slots are aligned across providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Slot `i` fuses the `i`-th point of every non-empty list; the number of
    /// slots is the length of the shortest list. Points at the same index are
    /// assumed to describe the same hour, which only holds when every provider
    /// starts at the same hour with the same step.
    #[default]
    Positional,
    /// Each point is placed in the slot of its own hour; a slot fuses at most
    /// one point per provider (the earliest).
    HourBucketed,
}

/// Builds hourly and daily views from a forecast series
#[derive(Debug, Clone)]
pub struct Aggregator {
    icons: IconSet,
    timezone: Tz,
    strategy: MergeStrategy,
    hourly_limit: usize,
    daily_limit: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            icons: IconSet::default(),
            timezone: Tz::UTC,
            strategy: MergeStrategy::default(),
            hourly_limit: HOURLY_LIMIT,
            daily_limit: DAILY_LIMIT,
        }
    }
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_icons(mut self, icons: IconSet) -> Self {
        self.icons = icons;
        self
    }

    /// Time zone whose hours and calendar days the views are cut by
    #[must_use]
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, hourly: usize, daily: usize) -> Self {
        self.hourly_limit = hourly;
        self.daily_limit = daily;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Hourly view: fused slots from the start of `now`'s hour onwards
    #[must_use]
    pub fn hourly(&self, series: &ForecastSeries, now: DateTime<Utc>) -> Vec<AveragedForecast> {
        let hour_start = self.hour_floor(now);
        let slots = match self.strategy {
            MergeStrategy::Positional => positional_slots(series),
            MergeStrategy::HourBucketed => self.hour_buckets(series),
        };

        let hourly: Vec<AveragedForecast> = slots
            .into_iter()
            .filter(|(timestamp, _)| *timestamp >= hour_start)
            .take(self.hourly_limit)
            .map(|(timestamp, entries)| average(entries, timestamp, &self.icons))
            .collect();

        debug!(
            strategy = ?self.strategy,
            sources = series.source_count(),
            slots = hourly.len(),
            "Computed hourly forecast"
        );
        hourly
    }

    /// Daily view: one fused reading per calendar day from `now`'s day onwards.
    ///
    /// Points are collected index by index up to the longest list and then
    /// grouped by the calendar date of their own timestamp, so a day may mix
    /// points from different providers and different list positions.
    #[must_use]
    pub fn daily(&self, series: &ForecastSeries, now: DateTime<Utc>) -> Vec<AveragedForecast> {
        let today = self.local_date(now);
        let mut by_date: BTreeMap<NaiveDate, Vec<ForecastPoint>> = BTreeMap::new();

        for i in 0..series.longest_len() {
            for (_, list) in series.non_empty() {
                if let Some(point) = list.get(i) {
                    by_date
                        .entry(self.local_date(point.timestamp))
                        .or_default()
                        .push(point.clone());
                }
            }
        }

        let daily: Vec<AveragedForecast> = by_date
            .into_iter()
            .filter(|(date, _)| *date >= today)
            .take(self.daily_limit)
            .filter_map(|(_, entries)| {
                let timestamp = entries.first()?.timestamp;
                Some(average(entries, timestamp, &self.icons))
            })
            .collect();

        debug!(
            sources = series.source_count(),
            days = daily.len(),
            "Computed daily forecast"
        );
        daily
    }

    fn hour_buckets(&self, series: &ForecastSeries) -> Vec<(DateTime<Utc>, Vec<ForecastPoint>)> {
        let mut buckets: BTreeMap<DateTime<Utc>, Vec<ForecastPoint>> = BTreeMap::new();
        for (source, list) in series.non_empty() {
            for point in list {
                let bucket = buckets.entry(self.hour_floor(point.timestamp)).or_default();
                if !bucket.iter().any(|p| p.source == source) {
                    bucket.push(point.clone());
                }
            }
        }
        buckets.into_iter().collect()
    }

    fn hour_floor(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local = instant.with_timezone(&self.timezone);
        local
            .duration_trunc(TimeDelta::hours(1))
            .map_or(instant, |start| start.with_timezone(&Utc))
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }
}

/// Slots built by list position, stamped with the first contributor's time
fn positional_slots(series: &ForecastSeries) -> Vec<(DateTime<Utc>, Vec<ForecastPoint>)> {
    (0..series.shortest_len())
        .filter_map(|i| {
            let entries: Vec<ForecastPoint> = series
                .non_empty()
                .filter_map(|(_, list)| list.get(i).cloned())
                .collect();
            let timestamp = entries.first()?.timestamp;
            Some((timestamp, entries))
        })
        .collect()
}

/// Hourly view with the default aggregator (UTC, positional merge, 25 slots)
#[must_use]
pub fn compute_hourly(series: &ForecastSeries, now: DateTime<Utc>) -> Vec<AveragedForecast> {
    Aggregator::default().hourly(series, now)
}

/// Daily view with the default aggregator (UTC days, 10 days)
#[must_use]
pub fn compute_daily(series: &ForecastSeries, now: DateTime<Utc>) -> Vec<AveragedForecast> {
    Aggregator::default().daily(series, now)
}
