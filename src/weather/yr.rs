//! Yr / MET Norway locationforecast (compact)

use super::{ForecastProvider, SourceClient, round_temperature};
use crate::models::{City, ForecastPoint, Source};
use crate::{Result, VaError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

const BASE_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/compact";

#[derive(Debug, Deserialize)]
struct YrResponse {
    properties: YrProperties,
}

#[derive(Debug, Deserialize)]
struct YrProperties {
    meta: YrMeta,
    timeseries: Vec<YrTimeSerie>,
}

#[derive(Debug, Deserialize)]
struct YrMeta {
    units: YrUnits,
}

#[derive(Debug, Deserialize)]
struct YrUnits {
    precipitation_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YrTimeSerie {
    time: DateTime<Utc>,
    data: YrData,
}

#[derive(Debug, Deserialize)]
struct YrData {
    instant: YrInstant,
    next_1_hours: Option<YrPeriod>,
    next_6_hours: Option<YrPeriod>,
    next_12_hours: Option<YrPeriod>,
}

#[derive(Debug, Deserialize)]
struct YrInstant {
    details: YrInstantDetails,
}

#[derive(Debug, Deserialize)]
struct YrInstantDetails {
    air_temperature: f64,
}

#[derive(Debug, Deserialize)]
struct YrPeriod {
    summary: Option<YrSummary>,
    details: Option<YrPeriodDetails>,
}

#[derive(Debug, Deserialize)]
struct YrSummary {
    symbol_code: String,
}

#[derive(Debug, Deserialize)]
struct YrPeriodDetails {
    precipitation_amount: Option<f64>,
}

/// Normalize a locationforecast response.
///
/// Symbol and precipitation come from the shortest period available
/// (1, then 6, then 12 hours).
pub fn parse(body: &str) -> Result<Vec<ForecastPoint>> {
    let response: YrResponse = serde_json::from_str(body)
        .map_err(|e| VaError::parse(Source::Yr, format!("invalid JSON: {e}")))?;
    let unit = response
        .properties
        .meta
        .units
        .precipitation_amount
        .unwrap_or_else(|| "mm".to_string());

    let forecast = response
        .properties
        .timeseries
        .into_iter()
        .map(|serie| {
            let period = serie
                .data
                .next_1_hours
                .or(serie.data.next_6_hours)
                .or(serie.data.next_12_hours);

            let description = period
                .as_ref()
                .and_then(|p| p.summary.as_ref())
                .map(|s| s.symbol_code.clone())
                .unwrap_or_default();
            let precipitation = period
                .as_ref()
                .and_then(|p| p.details.as_ref())
                .and_then(|d| d.precipitation_amount)
                .map_or_else(|| "N/A".to_string(), |amount| format!("{amount} {unit}"));

            ForecastPoint::new(
                Source::Yr,
                serie.time,
                description,
                round_temperature(serie.data.instant.details.air_temperature),
                precipitation,
            )
        })
        .collect();

    Ok(forecast)
}

pub struct YrProvider {
    client: Arc<SourceClient>,
}

impl YrProvider {
    #[must_use]
    pub fn new(client: Arc<SourceClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn url(city: &City) -> String {
        format!("{BASE_URL}?lat={}&lon={}", city.latitude, city.longitude)
    }
}

#[async_trait]
impl ForecastProvider for YrProvider {
    fn source(&self) -> Source {
        Source::Yr
    }

    async fn fetch(&self, city: &City) -> Result<Vec<ForecastPoint>> {
        self.client
            .fetch_normalized(Source::Yr, &city.cache_key(Source::Yr), &Self::url(city), parse)
            .await
    }
}
