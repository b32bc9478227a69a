//! In-process volatile cache with per-entry TTL

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, CacheStats, CacheValue},
    VolatileCache,
};
use crate::error::{KbError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Process-local cache used when no shared cache is configured
///
/// - Thread-safe async access via RwLock
/// - Expired entries read as misses and are dropped on access
/// - No early eviction: an entry lives until its TTL or an explicit delete
pub struct MemoryCache {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    store: Arc<RwLock<CacheStore>>,
}

/// Internal cache storage
struct CacheStore {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Current cache statistics
    stats: CacheStats,

    /// Total size of cached data in bytes
    current_size_bytes: usize,
}

impl MemoryCache {
    /// Create a new cache; an invalid configuration is a [`KbError::Config`]
    pub fn new(config: CacheConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| KbError::Config(format!("in-memory cache: {}", e)))?;
        info!("Initializing in-memory cache with config: {:?}", config);

        let store = CacheStore {
            entries: HashMap::new(),
            stats: CacheStats::default(),
            current_size_bytes: 0,
        };

        Ok(Self {
            config,
            store: Arc::new(RwLock::new(store)),
        })
    }

    /// Insert a value with the configured default TTL
    pub async fn insert(&self, key: CacheKey, value: CacheValue) {
        let ttl = self.config.default_ttl;
        self.insert_with_ttl(key, value, ttl).await
    }

    /// Insert or replace a value with an explicit TTL
    pub async fn insert_with_ttl(&self, key: CacheKey, value: CacheValue, ttl: Duration) {
        let entry = CacheEntry::new(key.clone(), value, ttl);
        let size = entry.metadata.size_bytes;

        let mut store = self.store.write().await;

        if let Some(previous) = store.entries.insert(key.clone(), entry) {
            debug!("Replacing cache entry: {}", key);
            store.current_size_bytes = store
                .current_size_bytes
                .saturating_sub(previous.metadata.size_bytes);
        } else {
            debug!("Inserting new cache entry: {}", key);
        }
        store.current_size_bytes += size;

        if store.entries.len() > self.config.max_entries {
            warn!(
                "In-memory cache holds {} entries, above soft capacity {}",
                store.entries.len(),
                self.config.max_entries
            );
        }

        self.update_stats(&mut store);
    }

    /// Get a live value; expired entries are removed and reported as misses
    pub async fn lookup(&self, key: &str) -> Option<CacheValue> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let expired = match store.entries.get_mut(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.mark_accessed();
                store.stats.hits += 1;
                debug!("Cache hit: {}", key);
                return Some(entry.value.clone());
            }
            None => false,
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.stats.evictions_ttl += 1;
            self.remove_entry(store, key);
        } else {
            debug!("Cache miss: {}", key);
        }
        store.stats.misses += 1;
        None
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &str) -> Option<CacheValue> {
        let mut store = self.store.write().await;
        store.stats.invalidations += 1;

        let removed = self.remove_entry(&mut store, key);
        if removed.is_some() {
            debug!("Removed cache entry: {}", key);
        }
        removed
    }

    /// Remove all expired entries
    pub async fn cleanup_expired(&self) -> Option<InvalidationEvent> {
        let mut store = self.store.write().await;

        let expired_keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        if expired_keys.is_empty() {
            return None;
        }

        for key in &expired_keys {
            self.remove_entry(&mut store, key);
        }
        store.stats.evictions_ttl += expired_keys.len() as u64;
        debug!("Cleaned up {} expired entries", expired_keys.len());

        let context = format!("Cleaned up {} expired entries", expired_keys.len());
        Some(InvalidationEvent::new(InvalidationReason::Expired, expired_keys).with_context(context))
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in cache (expired ones included until swept)
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Internal: Remove an entry from the store
    fn remove_entry(&self, store: &mut CacheStore, key: &str) -> Option<CacheValue> {
        let entry = store.entries.remove(key)?;
        store.current_size_bytes = store
            .current_size_bytes
            .saturating_sub(entry.metadata.size_bytes);
        self.update_stats(store);
        Some(entry.value)
    }

    /// Internal: Update cache statistics
    fn update_stats(&self, store: &mut CacheStore) {
        if self.config.enable_metrics {
            store.stats.size_bytes = store.current_size_bytes;
            store.stats.entries = store.entries.len();
        }
    }
}

#[async_trait]
impl VolatileCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.lookup(key).await)
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        self.insert_with_ttl(key.to_string(), value, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.remove(key).await;
        Ok(())
    }
}

/// Background task for automatic cache cleanup
pub async fn start_auto_cleanup(cache: Arc<MemoryCache>) {
    let interval = cache.config.cleanup_interval;

    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        if let Some(event) = cache.cleanup_expired().await {
            debug!(
                "Auto cleanup: {} keys expired, {} remain; {}",
                event.len(),
                cache.len().await,
                cache.stats().await
            );
        }
    }
}
