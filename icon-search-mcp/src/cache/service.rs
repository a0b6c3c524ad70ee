//! In-memory key-value cache with per-entry TTL and LRU eviction
//!
//! Entries expire lazily on read and through a periodic sweep task. The sweep
//! only holds a weak reference to the store, so dropping the service (or
//! calling [`CacheService::destroy`]) ends it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::cache::outputs::CacheStats;
use crate::config::CacheConfig;
use crate::error::{IconSearchError, Result};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    access_count: u64,
    last_accessed: Instant,
    /// Monotonic access sequence, breaks ties between equal instants
    access_seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
struct CacheStore<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sequence: AtomicU64,
}

impl<V> CacheStore<V> {
    fn lock(&self, key: &str) -> Result<MutexGuard<'_, HashMap<String, CacheEntry<V>>>> {
        self.entries
            .lock()
            .map_err(|e| IconSearchError::cache(key, format!("cache store lock poisoned: {e}")))
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove every expired entry, returning how many were dropped
    fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.lock("*")?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }
}

/// Generic TTL + LRU cache
#[derive(Debug)]
pub struct CacheService<V> {
    store: Arc<CacheStore<V>>,
    config: CacheConfig,
    shutdown: CancellationToken,
}

impl<V> CacheService<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache and start its background sweep when a tokio runtime is available.
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(CacheStore {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
        });
        let shutdown = CancellationToken::new();

        match (sweep_period(&config), tokio::runtime::Handle::try_current()) {
            (Some(period), Ok(handle)) => {
                handle.spawn(sweep_expired(
                    Arc::downgrade(&store),
                    period,
                    shutdown.clone(),
                ));
            }
            (None, _) => {
                tracing::warn!("Cache check period is zero; cache sweep disabled");
            }
            (_, Err(_)) => {
                tracing::debug!("No tokio runtime available; cache sweep disabled");
            }
        }

        Self {
            store,
            config,
            shutdown,
        }
    }

    /// Join key parts with `:`, lowercase, and replace anything outside `[a-z0-9:]` with `_`.
    pub fn generate_key<I, S>(parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parts
            .into_iter()
            .map(|part| part.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(":")
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Store a value, evicting the least recently accessed entry when a new key arrives at capacity.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.config.ttl);
        let seq = self.store.next_seq();
        let mut entries = self.store.lock(key)?;

        if !entries.contains_key(key) && entries.len() >= self.config.max_size {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_accessed, entry.access_seq))
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru_key {
                tracing::debug!("Evicting least recently used cache entry: {}", lru_key);
                entries.remove(&lru_key);
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                access_count: 0,
                last_accessed: now,
                access_seq: seq,
            },
        );
        Ok(())
    }

    /// Fetch a live value, touching its access metadata
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        let now = Instant::now();
        let seq = self.store.next_seq();
        let mut entries = self.store.lock(key)?;

        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }

        let value = entries.get_mut(key).map(|entry| {
            entry.access_count += 1;
            entry.last_accessed = now;
            entry.access_seq = seq;
            entry.value.clone()
        });

        let counter = if value.is_some() {
            &self.store.hits
        } else {
            &self.store.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);

        Ok(value)
    }

    pub fn has(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.store.lock(key)?;
        match entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                entries.remove(key);
                Ok(false)
            }
            Some(false) => Ok(true),
            None => Ok(false),
        }
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.lock(key)?.remove(key).is_some())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.lock("*")?.clear();
        Ok(())
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Concurrent callers missing on the same key each run their own factory;
    /// there is no per-key serialization.
    pub async fn get_or_set<F, Fut, E>(&self, key: &str, factory: F, ttl: Option<Duration>) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        let value = factory()
            .await
            .map_err(|e| IconSearchError::cache_source(key, e))?;
        self.set(key, value.clone(), ttl)?;
        Ok(value)
    }

    pub fn get_stats(&self) -> Result<CacheStats> {
        let now = Instant::now();
        let entries = self.store.lock("*")?;

        let total_accesses = entries.values().map(|e| e.access_count).sum();
        let expired_entries = entries.values().filter(|e| e.is_expired(now)).count();
        let hits = self.store.hits.load(Ordering::Relaxed);
        let misses = self.store.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        Ok(CacheStats {
            size: entries.len(),
            max_size: self.config.max_size,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            total_accesses,
            expired_entries,
        })
    }

    /// Stop the background sweep and drop every entry
    pub fn destroy(&self) -> Result<()> {
        self.shutdown.cancel();
        self.clear()
    }
}

impl<V> Drop for CacheService<V> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Period for the background sweep; `None` when it cannot run
fn sweep_period(config: &CacheConfig) -> Option<Duration> {
    (!config.check_period.is_zero()).then_some(config.check_period)
}

async fn sweep_expired<V>(store: Weak<CacheStore<V>>, period: Duration, shutdown: CancellationToken)
where
    V: Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let Some(store) = store.upgrade() else { break };
                match store.purge_expired() {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!("Cache sweep removed {} expired entries", removed),
                    Err(e) => tracing::warn!("Cache sweep failed: {}", e),
                }
            }
        }
    }

    tracing::debug!("Cache sweep stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(max_size: usize) -> CacheService<String> {
        CacheService::new(CacheConfig {
            ttl: Duration::from_secs(60),
            max_size,
            check_period: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_set_get_expire() -> Result<()> {
        let cache = cache_with(10);
        cache.set("k", "v".to_string(), Some(Duration::from_millis(50)))?;
        assert_eq!(cache.get("k")?, Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k")?, None);
        assert!(!cache.has("k")?);
        Ok(())
    }

    #[tokio::test]
    async fn test_lru_evicts_least_recently_accessed() -> Result<()> {
        let cache = cache_with(2);
        cache.set("first", "1".to_string(), None)?;
        cache.set("second", "2".to_string(), None)?;

        // Touch the older entry so the untouched one becomes the LRU victim
        assert!(cache.get("first")?.is_some());
        cache.set("third", "3".to_string(), None)?;

        assert!(cache.has("first")?);
        assert!(!cache.has("second")?);
        assert!(cache.has("third")?);
        Ok(())
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() -> Result<()> {
        let cache = cache_with(2);
        cache.set("a", "1".to_string(), None)?;
        cache.set("b", "2".to_string(), None)?;
        cache.set("a", "updated".to_string(), None)?;

        assert_eq!(cache.get("a")?, Some("updated".to_string()));
        assert!(cache.has("b")?);
        assert_eq!(cache.get_stats()?.size, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_clear() -> Result<()> {
        let cache = cache_with(10);
        cache.set("a", "1".to_string(), None)?;
        cache.set("b", "2".to_string(), None)?;

        assert!(cache.delete("a")?);
        assert!(!cache.delete("a")?);
        cache.clear()?;
        assert_eq!(cache.get_stats()?.size, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_set_runs_factory_once() -> Result<()> {
        let cache = cache_with(10);
        let calls = AtomicU64::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_set(
                    "computed",
                    || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, std::io::Error>("value".to_string())
                    },
                    None,
                )
                .await?;
            assert_eq!(value, "value");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_set_wraps_factory_error() {
        let cache = cache_with(10);
        let err = cache
            .get_or_set(
                "broken",
                || async { Err::<String, _>(std::io::Error::other("boom")) },
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), crate::error::ErrorCode::CacheError);
        assert!(err.to_string().contains("broken"));
        assert!(err.to_string().contains("boom"));
        assert!(!cache.has("broken").unwrap());
    }

    #[tokio::test]
    async fn test_stats() -> Result<()> {
        let cache = cache_with(10);
        cache.set("a", "1".to_string(), None)?;
        cache.set("gone", "2".to_string(), Some(Duration::from_millis(1)))?;
        cache.get("a")?;
        cache.get("a")?;
        cache.get("missing")?;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let stats = cache.get_stats()?;
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.total_accesses, 2);
        assert_eq!(stats.expired_entries, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_background_sweep_removes_expired() -> Result<()> {
        let cache: CacheService<String> = CacheService::new(CacheConfig {
            ttl: Duration::from_millis(10),
            max_size: 10,
            check_period: Duration::from_millis(20),
        });
        cache.set("a", "1".to_string(), None)?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Sweep, not a lazy read, removed the entry
        assert_eq!(cache.get_stats()?.size, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_check_period_disables_sweep() -> Result<()> {
        let config = CacheConfig {
            ttl: Duration::from_millis(5),
            max_size: 10,
            check_period: Duration::ZERO,
        };
        assert_eq!(sweep_period(&config), None);
        assert_eq!(
            sweep_period(&CacheConfig::default()),
            Some(Duration::from_secs(60))
        );

        let cache: CacheService<String> = CacheService::new(config);
        cache.set("a", "1".to_string(), None)?;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Lazy expiry still applies without the sweep
        assert_eq!(cache.get("a")?, None);
        assert_eq!(cache.get_stats()?.size, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_destroy_clears() -> Result<()> {
        let cache = cache_with(10);
        cache.set("a", "1".to_string(), None)?;
        cache.destroy()?;
        assert!(!cache.has("a")?);
        Ok(())
    }

    #[test]
    fn test_without_runtime() -> Result<()> {
        let cache = cache_with(10);
        cache.set("a", "1".to_string(), None)?;
        assert_eq!(cache.get("a")?, Some("1".to_string()));
        Ok(())
    }

    #[test]
    fn test_generate_key() {
        let key = CacheService::<String>::generate_key(["search", "home", "octicons"]);
        assert_eq!(key, CacheService::<String>::generate_key(["search", "home", "octicons"]));
        assert_eq!(key, "search:home:octicons");
        assert_ne!(key, CacheService::<String>::generate_key(["search", "house", "octicons"]));

        let key = CacheService::<String>::generate_key(["search", "Arrow Left!", "{\"limit\":5}"]);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' || c == '_')
        );
        assert_eq!(key, "search:arrow_left_:__limit_:5_");
    }
}
