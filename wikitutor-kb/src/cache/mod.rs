//! # Volatile Cache Tier
//!
//! Fast, expiring key-value storage consulted before the persistent store.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: every entry is written with a lifetime (24h by default)
//! - **Pluggable Backends**: in-process [`MemoryCache`] or shared [`RedisCache`]
//! - **Namespaced Keys**: `article:<topic>` and `links:<topic>` (see [`ResourceKind`])
//! - **Manual Invalidation**: all keys of a topic can be dropped at once
//!
//! Backend errors are returned to the caller; the resolution pipeline
//! treats them as misses.
//!
//! ## Example
//!
//! ```rust
//! use wikitutor_kb::cache::{CacheConfig, MemoryCache, ResourceKind, VolatileCache};
//! use std::time::Duration;
//!
//! # async fn example() -> wikitutor_kb::Result<()> {
//! let cache = MemoryCache::new(CacheConfig::default())?;
//! let key = ResourceKind::Article.key("Alan Turing");
//!
//! cache.set(&key, "Alan Turing was ...".to_string(), Duration::from_secs(3600)).await?;
//!
//! if let Some(intro) = cache.get(&key).await? {
//!     println!("Cache hit: {}", intro);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod memory;
pub mod redis;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_TTL, MAX_TTL};
pub use entry::{CacheEntry, CacheMetadata};
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use keys::{decode_links, encode_links, topic_keys, ResourceKind};
pub use memory::{start_auto_cleanup, MemoryCache};
pub use self::redis::RedisCache;
pub use types::{CacheKey, CacheStats, CacheValue};

/// Expiring string key-value store
#[async_trait]
pub trait VolatileCache: Send + Sync {
    /// Live value for `key`, or `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value
    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()>;

    /// Remove `key`; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<()>;
}
