//! OpenWeatherMap 5 day / 3 hour forecast

use super::{ForecastProvider, SourceClient, round_temperature};
use crate::models::{City, ForecastPoint, Source};
use crate::{Result, VaError};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// OWM steps in three hours; each step is repeated for every hour it covers
const STEP_HOURS: i64 = 3;

/// Share of a step's rain total falling in one hour, to two decimals
fn hourly_rain(step_total: f64) -> f64 {
    (step_total / STEP_HOURS as f64 * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    list: Vec<OwmEntry>,
}

#[derive(Debug, Deserialize)]
struct OwmEntry {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    rain: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

/// Normalize a `forecast` response (metric units) into hourly points
pub fn parse(body: &str) -> Result<Vec<ForecastPoint>> {
    let response: OwmResponse = serde_json::from_str(body)
        .map_err(|e| VaError::parse(Source::Owm, format!("invalid JSON: {e}")))?;

    let mut forecast = Vec::with_capacity(response.list.len() * STEP_HOURS as usize);
    for entry in response.list {
        let start = DateTime::from_timestamp(entry.dt, 0)
            .ok_or_else(|| VaError::parse(Source::Owm, format!("invalid timestamp {}", entry.dt)))?;
        let description = entry
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_default();
        let rain = entry
            .rain
            .as_ref()
            .and_then(|r| r.get("3h"))
            .copied()
            .map_or(0.0, hourly_rain);
        let precipitation = format!("{rain} mm");
        let temperature = round_temperature(entry.main.temp);

        for hour in 0..STEP_HOURS {
            forecast.push(ForecastPoint::new(
                Source::Owm,
                start + TimeDelta::hours(hour),
                description.clone(),
                temperature,
                precipitation.clone(),
            ));
        }
    }

    Ok(forecast)
}

pub struct OwmProvider {
    client: Arc<SourceClient>,
    api_key: String,
}

impl OwmProvider {
    #[must_use]
    pub fn new(client: Arc<SourceClient>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn url(&self, city: &City) -> String {
        format!(
            "{BASE_URL}?lat={}&lon={}&units=metric&appid={}",
            city.latitude,
            city.longitude,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl ForecastProvider for OwmProvider {
    fn source(&self) -> Source {
        Source::Owm
    }

    async fn fetch(&self, city: &City) -> Result<Vec<ForecastPoint>> {
        self.client
            .fetch_normalized(Source::Owm, &city.cache_key(Source::Owm), &self.url(city), parse)
            .await
    }
}
