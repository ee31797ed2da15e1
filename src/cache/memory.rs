use super::ForecastCache;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache holding at most `max_entries` values.
///
/// When full, expired entries are dropped first; if that frees nothing the
/// entry closest to expiry is evicted.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    max_entries: usize,
}

impl MemoryCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(256)
    }
}

fn make_room(entries: &mut HashMap<String, MemoryEntry>, max_entries: usize, now: Instant) {
    if entries.len() < max_entries {
        return;
    }

    let before = entries.len();
    entries.retain(|_, entry| entry.is_fresh(now));
    if entries.len() < max_entries {
        debug!("Purged {} expired entries", before - entries.len());
        return;
    }

    let soonest = entries
        .iter()
        .min_by_key(|(_, entry)| entry.expires_at)
        .map(|(key, _)| key.clone());
    if let Some(key) = soonest {
        debug!("Evicting {}", key);
        entries.remove(&key);
    }
}

#[async_trait]
impl ForecastCache for MemoryCache {
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        debug!("Key found but expired");
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_fresh(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now);

        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            make_room(&mut entries, self.max_entries, now);
        }
        entries.insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new(4);
        cache.set("dmi:ODENSE", "{}".to_string(), HOUR).await.unwrap();

        assert_eq!(cache.get("dmi:ODENSE").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(cache.get("yr:ODENSE").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_dropped() {
        let cache = MemoryCache::new(4);
        cache.set("k", "v".to_string(), Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = MemoryCache::new(4);
        cache.set("k", "v".to_string(), HOUR).await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_full_cache_purges_expired_first() {
        let cache = MemoryCache::new(2);
        cache.set("stale", "1".to_string(), Duration::ZERO).await.unwrap();
        cache.set("fresh", "2".to_string(), HOUR).await.unwrap();
        cache.set("new", "3".to_string(), HOUR).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("fresh").await.unwrap().is_some());
        assert!(cache.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_cache_evicts_soonest_expiry() {
        let cache = MemoryCache::new(2);
        cache.set("short", "1".to_string(), HOUR).await.unwrap();
        cache.set("long", "2".to_string(), HOUR * 2).await.unwrap();
        cache.set("new", "3".to_string(), HOUR).await.unwrap();

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert!(cache.get("long").await.unwrap().is_some());
        assert!(cache.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = MemoryCache::new(2);
        cache.set("a", "1".to_string(), HOUR).await.unwrap();
        cache.set("b", "2".to_string(), HOUR).await.unwrap();
        cache.set("a", "3".to_string(), HOUR).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("3"));
        assert!(cache.get("b").await.unwrap().is_some());
    }
}
