//! Opaque session tokens for filevault.
//!
//! A session is a single cache entry `auth_<token>` holding the user ID.
//! Expiry is delegated to the cache, so there is no server-side session
//! table and no cleanup task.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::KeyValueCache;
use crate::Result;

/// Default session lifetime (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Prefix for session keys in the cache.
pub const SESSION_KEY_PREFIX: &str = "auth_";

/// Issues, resolves, and revokes session tokens.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the default 24h lifetime.
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self::with_ttl(cache, Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }

    /// Create a store with a custom session lifetime.
    pub fn with_ttl(cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the backing cache is reachable.
    pub async fn is_alive(&self) -> bool {
        self.cache.is_alive().await
    }

    fn key(token: &str) -> String {
        format!("{SESSION_KEY_PREFIX}{token}")
    }

    /// Issue a new token for `user_id`.
    pub async fn create(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.cache
            .set_ex(&Self::key(&token), &user_id.to_string(), self.ttl)
            .await?;

        info!(user_id, "Session created");
        Ok(token)
    }

    /// Resolve a token to its user ID. Unknown and expired tokens yield `None`.
    ///
    /// Reading does not extend the session.
    pub async fn resolve(&self, token: &str) -> Result<Option<i64>> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(value) = self.cache.get(&Self::key(token)).await? else {
            debug!("Session token not found or expired");
            return Ok(None);
        };

        match value.parse::<i64>() {
            Ok(user_id) => Ok(Some(user_id)),
            Err(_) => {
                warn!("Session entry holds a non-numeric user id; treating as absent");
                Ok(None)
            }
        }
    }

    /// Revoke a token. Revoking an unknown token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.cache.del(&Self::key(token)).await?;
        debug!("Session revoked");
        Ok(())
    }
}
