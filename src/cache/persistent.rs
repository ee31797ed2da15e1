use super::ForecastCache;
use crate::{Result, VaError};
use async_trait::async_trait;
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    expires_at: u64, // Unix timestamp (seconds)
}

/// On-disk cache backed by a fjall keyspace, surviving restarts
pub struct PersistentCache {
    store: Keyspace,
}

fn cache_error(e: impl std::fmt::Display) -> VaError {
    VaError::cache(e.to_string())
}

fn get_from_store(store: &Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key).map_err(cache_error)?.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(cache_error)?
        .as_secs())
}

impl PersistentCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open().map_err(cache_error)?;
        let store = db
            .keyspace("forecast_cache", fjall::KeyspaceCreateOptions::default)
            .map_err(cache_error)?;
        Ok(Self { store })
    }
}

#[async_trait]
impl ForecastCache for PersistentCache {
    /// Returns `None` for cache misses or expired entries; expired entries
    /// are removed on the way out.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(&store, &key_bytes))
            .await
            .map_err(cache_error)??;

        let Some(bytes) = maybe_bytes else {
            debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry = postcard::from_bytes(&bytes).map_err(cache_error)?;
        if unix_now()? < entry.expires_at {
            debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = unix_now()?.saturating_add(ttl.as_secs());
        let bytes = postcard::to_stdvec(&StoredEntry { value, expires_at }).map_err(cache_error)?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(cache_error)?
            .map_err(cache_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(cache_error)?
            .map_err(cache_error)?;
        Ok(())
    }
}
