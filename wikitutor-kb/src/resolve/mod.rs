//! # Resolution Pipeline
//!
//! Every read goes Volatile Cache → Persistent Store → Origin, stopping at
//! the first tier that has the resource and writing the result back into
//! each tier above it.
//!
//! | Resource | Cache key          | Store                  | Origin                    |
//! |----------|--------------------|------------------------|---------------------------|
//! | article  | `article:<topic>`  | `articles` row         | [`OriginFetcher`]         |
//! | links    | `links:<topic>`    | `links` row            | [`LinkSource`]            |
//! | summary  | none               | `summaries` row        | [`SummaryGenerator`]      |
//!
//! Cache errors never fail a resolution; they read as misses and skipped
//! writes. Store write errors are logged and the freshly fetched value is
//! still returned. Concurrent resolutions of one topic may both reach the
//! origin; idempotent upserts make the duplicate writes harmless.

mod article;
mod links;
mod summary;

use crate::cache::{
    start_auto_cleanup, topic_keys, CacheConfig, CacheValue, InvalidationEvent,
    InvalidationReason, MemoryCache, RedisCache, VolatileCache, DEFAULT_TTL, MAX_TTL,
};
use crate::config::KbConfig;
use crate::error::{KbError, Result};
use crate::origin::{LinkPolicy, LinkSource, OriginFetcher, WikipediaClient};
use crate::store::{PersistentStore, SqliteStore};
use crate::summarize::{AnthropicClient, SummaryGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tier that served a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Cache,
    Store,
    Origin,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Cache => write!(f, "cache"),
            Tier::Store => write!(f, "store"),
            Tier::Origin => write!(f, "origin"),
        }
    }
}

/// How far down the tiers a read starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Cache, then store, then origin
    #[default]
    Tiered,
    /// Skip cache and store, fetch from the origin and write back
    Refresh,
}

/// A resolved value and the tier it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub tier: Tier,
}

impl<T> Resolved<T> {
    pub fn new(value: T, tier: Tier) -> Self {
        Self { value, tier }
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            tier: self.tier,
        }
    }
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// TTL for every volatile cache write
    pub cache_ttl: Duration,

    /// Link selection used on the origin path
    pub link_policy: LinkPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            link_policy: LinkPolicy::default(),
        }
    }
}

/// Trim and replace underscores with spaces; empty topics are rejected
pub fn normalize_topic(topic: &str) -> Result<String> {
    let normalized = topic.replace('_', " ").trim().to_string();
    if normalized.is_empty() {
        return Err(KbError::InvalidTopic(format!("{:?}", topic)));
    }
    Ok(normalized)
}

/// Three-tier resolver for articles, links and summaries
pub struct Resolver {
    cache: Arc<dyn VolatileCache>,
    store: Arc<dyn PersistentStore>,
    origin: Arc<dyn OriginFetcher>,
    link_source: Arc<dyn LinkSource>,
    generator: Option<Arc<dyn SummaryGenerator>>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// Wire the production collaborators described by `config`
    ///
    /// Opens the SQLite store, connects to Redis when a URL is configured
    /// (falling back to the in-process cache if it is unreachable) and sets
    /// up the Wikipedia and Anthropic clients. Without an API key the
    /// resolver serves stored summaries only.
    pub async fn connect(config: &KbConfig) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&config.db_path)?);
        let cache = connect_cache(config).await?;
        let wikipedia = Arc::new(WikipediaClient::from_config(config)?);

        let mut builder = Resolver::builder()
            .cache(cache)
            .store(store)
            .origin(wikipedia.clone())
            .link_source(wikipedia)
            .config(ResolverConfig {
                cache_ttl: config.cache_ttl,
                link_policy: config.link_policy,
            });

        if config.generator.api_key.is_some() {
            builder = builder.generator(Arc::new(AnthropicClient::from_config(&config.generator)?));
        } else {
            warn!("ANTHROPIC_API_KEY not set; only stored summaries can be served");
        }

        builder.build()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Drop a topic's volatile entries; the persistent store is untouched
    pub async fn invalidate(&self, topic: &str) -> Result<InvalidationEvent> {
        let topic = normalize_topic(topic)?;
        let keys = topic_keys(&topic);

        for key in &keys {
            if let Err(e) = self.cache.delete(key).await {
                warn!("Cache delete failed for {}: {}", key, e);
            }
        }

        info!("Invalidated cache entries for '{}'", topic);
        Ok(InvalidationEvent::new(InvalidationReason::Manual, keys)
            .with_context(format!("topic {}", topic)))
    }

    /// Cache read that degrades to a miss on error
    async fn cache_get(&self, key: &str) -> Option<CacheValue> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Cache write that logs and moves on
    async fn cache_put(&self, key: &str, value: CacheValue) {
        match self.cache.set(key, value, self.config.cache_ttl).await {
            Ok(()) => debug!("Cached {}", key),
            Err(e) => warn!("Cache write failed for {}: {}", key, e),
        }
    }
}

async fn connect_cache(config: &KbConfig) -> Result<Arc<dyn VolatileCache>> {
    if let Some(url) = &config.redis_url {
        match RedisCache::connect(url).await {
            Ok(cache) => return Ok(Arc::new(cache)),
            Err(e) => warn!("Redis unavailable ({}), using in-process cache", e),
        }
    }

    let cache_config = CacheConfig::builder().default_ttl(config.cache_ttl).build();
    let cache = Arc::new(MemoryCache::new(cache_config)?);
    if cache.config.enable_auto_cleanup {
        tokio::spawn(start_auto_cleanup(cache.clone()));
    }
    Ok(cache)
}

/// Builder for [`Resolver`]
#[derive(Default)]
pub struct ResolverBuilder {
    cache: Option<Arc<dyn VolatileCache>>,
    store: Option<Arc<dyn PersistentStore>>,
    origin: Option<Arc<dyn OriginFetcher>>,
    link_source: Option<Arc<dyn LinkSource>>,
    generator: Option<Arc<dyn SummaryGenerator>>,
    config: ResolverConfig,
}

impl ResolverBuilder {
    pub fn cache(mut self, cache: Arc<dyn VolatileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn origin(mut self, origin: Arc<dyn OriginFetcher>) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn link_source(mut self, link_source: Arc<dyn LinkSource>) -> Self {
        self.link_source = Some(link_source);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn SummaryGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn link_policy(mut self, policy: LinkPolicy) -> Self {
        self.config.link_policy = policy;
        self
    }

    /// Build the resolver; cache, store, origin and link source are required
    pub fn build(self) -> Result<Resolver> {
        let missing = |name: &str| KbError::Config(format!("resolver needs a {}", name));

        if self.config.cache_ttl.is_zero() {
            return Err(KbError::Config("cache TTL must be greater than 0".to_string()));
        }
        if self.config.cache_ttl > MAX_TTL {
            return Err(KbError::Config(format!(
                "cache TTL must be at most {} seconds",
                MAX_TTL.as_secs()
            )));
        }

        Ok(Resolver {
            cache: self.cache.ok_or_else(|| missing("volatile cache"))?,
            store: self.store.ok_or_else(|| missing("persistent store"))?,
            origin: self.origin.ok_or_else(|| missing("origin fetcher"))?,
            link_source: self.link_source.ok_or_else(|| missing("link source"))?,
            generator: self.generator,
            config: self.config,
        })
    }
}
