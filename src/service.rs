//! Weather service
//!
//! Fans out to every configured provider for a city, tolerates individual
//! provider failures and hands the collected series to the aggregator.

use crate::cache::{ForecastCache, MemoryCache, PersistentCache};
use crate::config::{CacheBackend, VaConfig};
use crate::forecast::Aggregator;
use crate::models::{AveragedForecast, City, ForecastSeries, Source, SunData};
use crate::Result;
use crate::weather::{self, DmiProvider, ForecastProvider, OwmProvider, SourceClient, YrProvider};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one provider fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    Ok { points: usize },
    Empty,
    Failed { reason: String },
}

impl SourceStatus {
    #[must_use]
    pub fn has_points(&self) -> bool {
        matches!(self, SourceStatus::Ok { .. })
    }
}

/// How much of the provider set contributed to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outage {
    /// Every provider returned points
    None,
    /// At least one provider returned points and at least one did not
    Partial,
    /// No provider returned points
    Total,
}

impl Outage {
    fn from_statuses(statuses: &BTreeMap<Source, SourceStatus>) -> Self {
        let with_points = statuses.values().filter(|s| s.has_points()).count();
        if with_points == 0 {
            Outage::Total
        } else if with_points < statuses.len() {
            Outage::Partial
        } else {
            Outage::None
        }
    }
}

/// Series for one city together with the per-provider outcome
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub series: ForecastSeries,
    pub statuses: BTreeMap<Source, SourceStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub city: City,
    pub generated_at: DateTime<Utc>,
    pub hourly: Vec<AveragedForecast>,
    pub daily: Vec<AveragedForecast>,
    pub sources: BTreeMap<Source, SourceStatus>,
    pub outage: Outage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub attempted: usize,
    pub succeeded: usize,
}

pub struct WeatherService {
    providers: Vec<Arc<dyn ForecastProvider>>,
    aggregator: Aggregator,
}

impl WeatherService {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn ForecastProvider>>, aggregator: Aggregator) -> Self {
        Self {
            providers,
            aggregator,
        }
    }

    /// Build the cache, HTTP client and providers described by `config`.
    ///
    /// OWM is only registered when an API key is configured.
    pub fn from_config(config: &VaConfig) -> anyhow::Result<Self> {
        let cache: Arc<dyn ForecastCache> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new(config.cache.max_entries)),
            CacheBackend::Persistent => {
                let location = config.cache.resolved_location();
                std::fs::create_dir_all(&location)?;
                debug!("Opening persistent cache at {}", location.display());
                Arc::new(PersistentCache::open(location)?)
            }
        };
        let client = Arc::new(SourceClient::new(&config.sources, cache, config.cache.ttl())?);

        let mut providers: Vec<Arc<dyn ForecastProvider>> = vec![
            Arc::new(DmiProvider::new(client.clone())),
            Arc::new(YrProvider::new(client.clone())),
        ];
        match &config.sources.owm_api_key {
            Some(key) => providers.push(Arc::new(OwmProvider::new(client, key.clone()))),
            None => warn!("No OpenWeatherMap API key configured, skipping OWM"),
        }

        Ok(Self::new(providers, config.aggregator()?))
    }

    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    #[must_use]
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Fetch every provider concurrently. A failing provider contributes an
    /// empty list and a `Failed` status instead of failing the whole series.
    #[instrument(level = "debug", skip(self, city), fields(city = city.name))]
    pub async fn fetch_series(&self, city: &City) -> FetchedSeries {
        let results = futures::future::join_all(
            self.providers
                .iter()
                .map(|provider| async move { (provider.source(), provider.fetch(city).await) })
                .collect::<Vec<_>>(),
        )
        .await;

        let mut series = ForecastSeries::with_sources(&self.sources());
        let mut statuses = BTreeMap::new();
        for (source, result) in results {
            let status = match result {
                Ok(points) if points.is_empty() => SourceStatus::Empty,
                Ok(points) => {
                    series.insert(source, points);
                    match series.get(source).len() {
                        0 => SourceStatus::Empty,
                        points => SourceStatus::Ok { points },
                    }
                }
                Err(err) => {
                    warn!("Failed to fetch {} for {}: {}", source, city.name, err);
                    SourceStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            statuses.insert(source, status);
        }

        FetchedSeries { series, statuses }
    }

    /// Hourly and daily views for `city` as of `now`
    pub async fn forecast(&self, city: &City, now: DateTime<Utc>) -> ForecastReport {
        let FetchedSeries { series, statuses } = self.fetch_series(city).await;
        let outage = Outage::from_statuses(&statuses);
        match outage {
            Outage::Total => warn!("No provider returned data for {}", city.name),
            Outage::Partial => info!("Partial provider outage for {}", city.name),
            Outage::None => {}
        }

        ForecastReport {
            city: *city,
            generated_at: now,
            hourly: self.aggregator.hourly(&series, now),
            daily: self.aggregator.daily(&series, now),
            sources: statuses,
            outage,
        }
    }

    /// Fetch every city from every provider so later requests hit the cache
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_all(&self) -> RefreshSummary {
        let fetches = City::all()
            .iter()
            .flat_map(|city| self.providers.iter().map(move |provider| (city, provider)))
            .map(|(city, provider)| async move {
                match provider.fetch(city).await {
                    Ok(_) => true,
                    Err(err) => {
                        warn!("Refresh of {} for {} failed: {}", provider.source(), city.name, err);
                        false
                    }
                }
            })
            .collect::<Vec<_>>();

        let results = futures::future::join_all(fetches).await;
        let summary = RefreshSummary {
            attempted: results.len(),
            succeeded: results.iter().filter(|ok| **ok).count(),
        };
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "Refreshed forecast cache"
        );
        summary
    }

    pub fn sun(&self, city: &City, start: NaiveDate, days: u32) -> Result<SunData> {
        weather::sun_data(city, start, days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VaError;
    use crate::models::ForecastPoint;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        source: Source,
        temperature: Option<i32>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn ok(source: Source, temperature: i32) -> Arc<Self> {
            Arc::new(Self {
                source,
                temperature: Some(temperature),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(source: Source) -> Arc<Self> {
            Arc::new(Self {
                source,
                temperature: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ForecastProvider for FakeProvider {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch(&self, _city: &City) -> Result<Vec<ForecastPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let temperature = self
                .temperature
                .ok_or_else(|| VaError::fetch(self.source, "connection refused"))?;
            Ok((0..30)
                .map(|h| ForecastPoint::new(self.source, start() + Duration::hours(h), "", temperature, "N/A"))
                .collect())
        }
    }

    fn service_with(fakes: Vec<Arc<FakeProvider>>) -> WeatherService {
        let providers = fakes
            .into_iter()
            .map(|fake| fake as Arc<dyn ForecastProvider>)
            .collect();
        WeatherService::new(providers, Aggregator::new())
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn odense() -> City {
        City::find("Odense").unwrap()
    }

    #[tokio::test]
    async fn test_forecast_with_all_sources() {
        let service = service_with(vec![FakeProvider::ok(Source::Dmi, 2), FakeProvider::ok(Source::Yr, 4)]);

        let report = service.forecast(&odense(), start()).await;
        assert_eq!(report.outage, Outage::None);
        assert_eq!(report.hourly.len(), 25);
        assert!(report.hourly.iter().all(|h| h.temperature == 3));
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.sources[&Source::Dmi], SourceStatus::Ok { points: 30 });
    }

    #[tokio::test]
    async fn test_failed_provider_is_tolerated() {
        let service = service_with(vec![FakeProvider::ok(Source::Dmi, 2), FakeProvider::failing(Source::Owm)]);

        let fetched = service.fetch_series(&odense()).await;
        assert!(fetched.series.get(Source::Owm).is_empty());
        assert_eq!(fetched.series.get(Source::Dmi).len(), 30);
        assert!(matches!(fetched.statuses[&Source::Owm], SourceStatus::Failed { .. }));

        let report = service.forecast(&odense(), start()).await;
        assert_eq!(report.outage, Outage::Partial);
        assert!(report.hourly.iter().all(|h| h.temperature == 2 && h.entries.len() == 1));
    }

    struct MislabelledProvider;

    #[async_trait]
    impl ForecastProvider for MislabelledProvider {
        fn source(&self) -> Source {
            Source::Dmi
        }

        async fn fetch(&self, _city: &City) -> Result<Vec<ForecastPoint>> {
            Ok(vec![ForecastPoint::new(Source::Yr, start(), "3", 1, "N/A")])
        }
    }

    #[tokio::test]
    async fn test_points_under_wrong_source_are_not_counted() {
        let mislabelled: Arc<dyn ForecastProvider> = Arc::new(MislabelledProvider);
        let yr: Arc<dyn ForecastProvider> = FakeProvider::ok(Source::Yr, 9);
        let providers = vec![mislabelled, yr];
        let service = WeatherService::new(providers, Aggregator::new());

        let report = service.forecast(&odense(), start()).await;
        assert_eq!(report.sources[&Source::Dmi], SourceStatus::Empty);
        assert_eq!(report.outage, Outage::Partial);
        assert!(report.hourly.iter().all(|h| h.sources() == vec![Source::Yr] && h.temperature == 9));
    }

    #[tokio::test]
    async fn test_total_outage_yields_empty_views() {
        let service = service_with(vec![FakeProvider::failing(Source::Dmi), FakeProvider::failing(Source::Yr)]);

        let report = service.forecast(&odense(), start()).await;
        assert_eq!(report.outage, Outage::Total);
        assert!(report.hourly.is_empty());
        assert!(report.daily.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_all_visits_every_city_and_provider() {
        let dmi = FakeProvider::ok(Source::Dmi, 1);
        let yr = FakeProvider::failing(Source::Yr);
        let service = service_with(vec![dmi.clone(), yr.clone()]);

        let summary = service.refresh_all().await;
        let cities = City::all().len();
        assert_eq!(summary.attempted, cities * 2);
        assert_eq!(summary.succeeded, cities);
        assert_eq!(dmi.calls.load(Ordering::SeqCst), cities);
        assert_eq!(yr.calls.load(Ordering::SeqCst), cities);
    }

    #[test]
    fn test_outage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Outage::Partial).unwrap(), "\"partial\"");
        assert_eq!(
            serde_json::to_string(&SourceStatus::Ok { points: 3 }).unwrap(),
            r#"{"status":"ok","points":3}"#
        );
    }
}
