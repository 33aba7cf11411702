//! Redis-backed session cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::warn;

use super::KeyValueCache;
use crate::{Result, VaultError};

fn cache_error(e: redis::RedisError) -> VaultError {
    VaultError::Cache(format!("redis: {e}"))
}

/// Cache stored in Redis with native `SET .. EX` expiry.
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Create a client for `url`. No connection is made until the first call.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_error)
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<()>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn is_alive(&self) -> bool {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Redis is unreachable");
                return false;
            }
        };
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
