//! Danish Meteorological Institute city forecast

use super::{ForecastProvider, SourceClient, round_temperature};
use crate::models::{City, ForecastPoint, Source};
use crate::{Result, VaError};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Copenhagen;
use serde::Deserialize;
use std::sync::Arc;

const BASE_URL: &str = "https://www.dmi.dk/NinJo2DmiDk/ninjo2dmidk?cmd=llj";

/// DMI timestamps are Copenhagen wall-clock time in this layout
const TIME_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Deserialize)]
struct DmiResponse {
    timeserie: Vec<DmiTimeSerie>,
}

#[derive(Debug, Deserialize)]
struct DmiTimeSerie {
    #[serde(default)]
    time: Option<String>,
    temp: f64,
    symbol: i64,
}

/// Normalize a DMI `llj` response.
///
/// Entries without a time are skipped; a time that cannot be read fails the
/// whole response. DMI publishes no precipitation in this feed.
pub fn parse(body: &str) -> Result<Vec<ForecastPoint>> {
    let response: DmiResponse = serde_json::from_str(body)
        .map_err(|e| VaError::parse(Source::Dmi, format!("invalid JSON: {e}")))?;

    let mut forecast = Vec::with_capacity(response.timeserie.len());
    for point in response.timeserie {
        let Some(time) = point.time.filter(|t| !t.is_empty()) else {
            continue;
        };

        let local = NaiveDateTime::parse_from_str(&time, TIME_FORMAT)
            .map_err(|e| VaError::parse(Source::Dmi, format!("invalid date '{time}': {e}")))?;
        let timestamp = Copenhagen
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| VaError::parse(Source::Dmi, format!("nonexistent local time '{time}'")))?
            .with_timezone(&Utc);

        forecast.push(ForecastPoint::new(
            Source::Dmi,
            timestamp,
            point.symbol.to_string(),
            round_temperature(point.temp),
            "N/A",
        ));
    }

    Ok(forecast)
}

pub struct DmiProvider {
    client: Arc<SourceClient>,
}

impl DmiProvider {
    #[must_use]
    pub fn new(client: Arc<SourceClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn url(city: &City) -> String {
        format!("{BASE_URL}&id={}", city.geonames_id)
    }
}

#[async_trait]
impl ForecastProvider for DmiProvider {
    fn source(&self) -> Source {
        Source::Dmi
    }

    async fn fetch(&self, city: &City) -> Result<Vec<ForecastPoint>> {
        self.client
            .fetch_normalized(Source::Dmi, &city.cache_key(Source::Dmi), &Self::url(city), parse)
            .await
    }
}
