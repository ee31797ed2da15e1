//! Provider fetchers
//!
//! Each provider turns its own response format into [`ForecastPoint`]s with
//! absolute UTC instants and rounded Celsius temperatures. Raw response
//! bodies go through a read-through cache so repeated requests for the same
//! city within the TTL never leave the process.

use crate::cache::ForecastCache;
use crate::config::SourcesConfig;
use crate::models::{City, ForecastPoint, Source};
use crate::{Result, VaError};
use async_trait::async_trait;
use rand::RngExt;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub mod dmi;
pub mod owm;
pub mod sun;
pub mod yr;

pub use dmi::DmiProvider;
pub use owm::OwmProvider;
pub use sun::{get_sunrise_sunset, sun_data};
pub use yr::YrProvider;

/// A source of normalized forecast points for a city
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    fn source(&self) -> Source;

    /// Points for `city`, ascending by timestamp
    async fn fetch(&self, city: &City) -> Result<Vec<ForecastPoint>>;
}

/// Normalizes a raw provider body
pub type Normalizer = fn(&str) -> Result<Vec<ForecastPoint>>;

/// HTTP access shared by all providers: retries, timeout and the body cache
pub struct SourceClient {
    http: ClientWithMiddleware,
    cache: Arc<dyn ForecastCache>,
    ttl: Duration,
}

impl SourceClient {
    pub fn new(config: &SourcesConfig, cache: Arc<dyn ForecastCache>, ttl: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| VaError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { http, cache, ttl })
    }

    /// Cached-or-downloaded points for one provider and city.
    ///
    /// Only bodies that normalize cleanly are stored; an unreadable cached
    /// body is ignored and downloaded again.
    #[instrument(name = "fetch_source", level = "debug", skip(self, url, normalize))]
    pub async fn fetch_normalized(
        &self,
        source: Source,
        key: &str,
        url: &str,
        normalize: Normalizer,
    ) -> Result<Vec<ForecastPoint>> {
        match self.cache.get(key).await {
            Ok(Some(body)) => match normalize(&body) {
                Ok(points) => {
                    debug!("Fetched {} from cache", key);
                    return Ok(points);
                }
                Err(e) => warn!("Discarding unreadable cached body for {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}: {}", key, e),
        }

        let body = self.download(source, url).await?;
        let points = normalize(&body)?;
        debug!("Fetched {} from source ({} points)", key, points.len());

        if let Err(e) = self.cache.set(key, body, self.jittered_ttl()).await {
            warn!("Failed to cache body for {}: {}", key, e);
        }
        Ok(points)
    }

    async fn download(&self, source: Source, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VaError::fetch(source, format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| VaError::fetch(source, format!("bad status: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| VaError::fetch(source, format!("failed to read body: {e}")))
    }

    /// TTL spread by ±10% so bodies fetched together do not expire together
    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        self.ttl.mul_f64(jitter)
    }
}

/// Round half up, the way the providers' readings are presented
#[must_use]
pub fn round_temperature(celsius: f64) -> i32 {
    (celsius + 0.5).floor() as i32
}
