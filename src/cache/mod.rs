//! Expiring key-value cache used for session tokens.
//!
//! `KeyValueCache` is the seam: `MemoryCache` keeps entries in-process with
//! moka, `RedisCache` (feature `redis`) talks to a Redis server.

#[cfg(feature = "redis")]
mod redis_cache;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use tracing::info;

use crate::config::{CacheBackend, CacheConfig};
use crate::Result;

/// String-to-string cache with per-entry time-to-live.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a value. Expired or missing keys return `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn del(&self, key: &str) -> Result<()>;

    /// Whether the backend is reachable.
    async fn is_alive(&self) -> bool;
}

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    // Overwrites restart the clock with the new entry's TTL.
    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by `moka::future::Cache`.
///
/// Reads never extend an entry's lifetime.
pub struct MemoryCache {
    cache: Cache<String, CachedValue>,
}

impl MemoryCache {
    /// Create a cache holding at most `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }

    /// Number of live entries (approximate, as reported by moka).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key).await.map(|v| v.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        true
    }
}

/// Build the cache selected by `config.backend`.
pub fn from_config(config: &CacheConfig) -> Result<Arc<dyn KeyValueCache>> {
    match config.backend {
        CacheBackend::Memory => {
            info!(max_capacity = config.max_capacity, "Using in-process session cache");
            Ok(Arc::new(MemoryCache::new(config.max_capacity)))
        }
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            info!("Using Redis session cache at {}", config.redis_url);
            Ok(Arc::new(RedisCache::new(&config.redis_url)?))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(crate::VaultError::Config(
            "cache.backend = \"redis\" requires the `redis` feature".to_string(),
        )),
    }
}
