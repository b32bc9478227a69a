//! Shared volatile cache backed by Redis
//!
//! Values are plain strings written with `SET key value EX <secs>`, so
//! expiry is enforced by the server. The connection manager reconnects on
//! its own; a failed command surfaces as [`KbError::Cache`].

use crate::cache::{types::CacheValue, VolatileCache};
use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, info};

/// Redis-backed [`VolatileCache`]
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(url: &str) -> Result<Self> {
        info!(redis_url = %url, "Connecting to Redis cache");

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

/// Redis EX takes whole seconds; sub-second TTLs round up to one
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    (ttl.as_secs_f64().ceil() as u64).max(1)
}

#[async_trait]
impl VolatileCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        debug!(key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        debug!(key, ttl_secs = ttl_secs(ttl), "Redis SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        debug!(key, removed, "Redis DEL");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_secs(Duration::from_secs(86_400)), 86_400);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = RedisCache::connect("not-a-redis-url").await;
        assert!(matches!(result, Err(crate::error::KbError::Cache(_))));
    }

    /// Requires a running Redis at REDIS_URL (default redis://127.0.0.1:6379)
    #[tokio::test]
    #[ignore]
    async fn test_live_round_trip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let cache = RedisCache::connect(&url).await.unwrap();

        let key = "article:__wikitutor_test__";
        cache
            .set(key, "intro".to_string(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(cache.get(key).await.unwrap(), Some("intro".to_string()));

        cache.delete(key).await.unwrap();
        assert_eq!(cache.get(key).await.unwrap(), None);
    }
}
