//! Expiring key/value storage for raw provider responses

mod memory;
mod persistent;

pub use memory::MemoryCache;
pub use persistent::PersistentCache;

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ForecastCache: Send + Sync {
    /// The stored value, or `None` when missing or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` until `ttl` has elapsed
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
