//! Integration tests for the `va` public API

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;
use std::collections::HashSet;
use std::sync::Arc;
use va::forecast::average::rounded_mean;
use va::{
    Aggregator, AveragedForecast, City, ForecastCache, ForecastPoint, ForecastProvider, ForecastSeries,
    MemoryCache, MergeStrategy, Outage, Source, VaError, WeatherService, compute_daily, compute_hourly,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn run(source: Source, start: DateTime<Utc>, hours: i64, base: i32) -> Vec<ForecastPoint> {
    (0..hours)
        .map(|h| {
            let temperature = base + i32::try_from(h % 7).unwrap() - 3;
            ForecastPoint::new(source, start + Duration::hours(h), "", temperature, "N/A")
        })
        .collect()
}

fn mixed_series() -> ForecastSeries {
    ForecastSeries::with_sources(&Source::ALL)
        .with(Source::Dmi, run(Source::Dmi, at(1, 0), 60, 2))
        .with(Source::Yr, run(Source::Yr, at(1, 1), 240, 4))
        .with(Source::Owm, run(Source::Owm, at(1, 0), 120, -1))
}

fn assert_well_formed(forecast: &AveragedForecast, max_sources: usize) {
    assert!(forecast.entries.len() <= max_sources);
    let temps: Vec<i32> = forecast.entries.iter().map(|e| e.temperature).collect();
    if let Some(mean) = rounded_mean(&temps) {
        assert_eq!(forecast.temperature, mean);
    }
    match (forecast.low_temperature, forecast.high_temperature) {
        (Some(low), Some(high)) => {
            assert!(high >= low);
            assert_eq!(low, *temps.iter().min().unwrap());
            assert_eq!(high, *temps.iter().max().unwrap());
        }
        (None, None) => assert!(forecast.entries.is_empty()),
        other => panic!("inconsistent temperature band {other:?}"),
    }
}

#[rstest]
#[case(MergeStrategy::Positional)]
#[case(MergeStrategy::HourBucketed)]
fn test_hourly_slots_hold_one_point_per_source(#[case] strategy: MergeStrategy) {
    let series = mixed_series();
    let hourly = Aggregator::new().with_strategy(strategy).hourly(&series, at(1, 5));

    assert!(!hourly.is_empty());
    assert!(hourly.len() <= 25);
    assert!(hourly.iter().all(|h| h.timestamp >= at(1, 5)));
    for slot in &hourly {
        assert_well_formed(slot, series.source_count());
        let sources: HashSet<Source> = slot.entries.iter().map(|e| e.source).collect();
        assert_eq!(sources.len(), slot.entries.len());
    }
}

#[test]
fn test_daily_views_are_sorted_and_capped() {
    let daily = compute_daily(&mixed_series(), at(1, 12));
    assert_eq!(daily.len(), 10);
    assert!(daily.windows(2).all(|w| w[0].timestamp.date_naive() < w[1].timestamp.date_naive()));
    for day in &daily {
        assert_well_formed(day, usize::MAX);
    }
}

#[test]
fn test_aggregate_captured_series_json() {
    let body = r#"{
        "tv2": [{"source": "tv2", "timestamp": "2024-01-01T10:00:00Z", "description": "Let skyet", "temperature": 5, "precipitation": "0 mm"}],
        "dmi": [{"source": "dmi", "timestamp": "2024-01-01T10:00:00Z", "description": "3", "temperature": 7, "precipitation": "N/A"}],
        "yr": null,
        "owm": []
    }"#;
    let series: ForecastSeries = serde_json::from_str(body).unwrap();

    let hourly = compute_hourly(&series, at(1, 10));
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].temperature, 6);
    assert_eq!(hourly[0].description, "Let skyet");
    assert_eq!(hourly[0].icon_url, "https://www.dmi.dk/assets/img/3.svg");

    let json = serde_json::to_value(&hourly[0]).unwrap();
    assert_eq!(json["lowTemperature"], 5);
    assert_eq!(json["highTemperature"], 7);
    assert_eq!(json["consensus"]["level"], "high");
}

#[test]
fn test_invalid_timestamp_is_rejected_on_input() {
    let body = r#"{"dmi": [{"source": "dmi", "timestamp": "not a time", "description": "", "temperature": 1, "precipitation": ""}]}"#;
    assert!(serde_json::from_str::<ForecastSeries>(body).is_err());
}

#[rstest]
#[case(MergeStrategy::Positional)]
#[case(MergeStrategy::HourBucketed)]
fn test_series_with_mislabelled_points_is_rejected(#[case] strategy: MergeStrategy) {
    let body = r#"{
        "dmi": [{"source": "yr", "timestamp": "2024-01-01T10:00:00Z", "description": "3", "temperature": 1, "precipitation": "N/A"}],
        "yr": [{"source": "yr", "timestamp": "2024-01-01T10:00:00Z", "description": "cloudy", "temperature": 9, "precipitation": "N/A"}]
    }"#;
    assert!(serde_json::from_str::<ForecastSeries>(body).is_err());

    let mislabelled = vec![ForecastPoint::new(Source::Yr, at(1, 10), "3", 1, "N/A")];
    let series = ForecastSeries::new()
        .with(Source::Dmi, mislabelled)
        .with(Source::Yr, run(Source::Yr, at(1, 10), 1, 12));
    let hourly = Aggregator::new().with_strategy(strategy).hourly(&series, at(1, 10));
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].sources(), vec![Source::Yr]);
    assert_eq!(hourly[0].temperature, 9);
}

struct CachedProvider {
    source: Source,
    cache: Arc<dyn ForecastCache>,
}

#[async_trait]
impl ForecastProvider for CachedProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self, city: &City) -> va::Result<Vec<ForecastPoint>> {
        let key = city.cache_key(self.source);
        let body = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| VaError::fetch(self.source, "nothing cached"))?;
        serde_json::from_str(&body).map_err(|e| VaError::parse(self.source, e.to_string()))
    }
}

#[tokio::test]
async fn test_service_reads_through_memory_cache() {
    let cache: Arc<dyn ForecastCache> = Arc::new(MemoryCache::new(16));
    let city = City::find("aarhus").unwrap();
    let points = run(Source::Dmi, at(1, 0), 48, 3);
    cache
        .set(
            &city.cache_key(Source::Dmi),
            serde_json::to_string(&points).unwrap(),
            std::time::Duration::from_secs(60),
        )
        .await
        .unwrap();

    let providers: Vec<Arc<dyn ForecastProvider>> = vec![
        Arc::new(CachedProvider {
            source: Source::Dmi,
            cache: cache.clone(),
        }),
        Arc::new(CachedProvider {
            source: Source::Yr,
            cache,
        }),
    ];
    let service = WeatherService::new(providers, Aggregator::new());

    let report = service.forecast(&city, at(1, 0)).await;
    assert_eq!(report.outage, Outage::Partial);
    assert_eq!(report.hourly.len(), 25);
    assert_eq!(report.daily.len(), 2);
    assert!(report.hourly.iter().all(|h| h.sources() == vec![Source::Dmi]));
}
