//! # Wiki Tutor Knowledge Base (wikitutor-kb)
//!
//! Wikipedia intros, lead-section links and reading-level summaries behind
//! a three-tier read path.
//!
//! ## Features
//!
//! - Volatile cache tier with TTL (in-process or Redis)
//! - Persistent SQLite store with idempotent, topic-keyed upserts
//! - MediaWiki origin client with cooperative request pacing
//! - One-call generation of basic, intermediate and advanced summaries
//! - Write-back from each lower tier into every tier above it
//! - Cache failures degrade to misses instead of failing requests
//!
//! ## Resolving a topic
//!
//! ```no_run
//! use wikitutor_kb::{KbConfig, Level, Resolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = KbConfig::from_env()?;
//!     let resolver = Resolver::connect(&config).await?;
//!
//!     let intro = resolver.resolve_article("Alan_Turing").await?;
//!     println!("[{}] {}", intro.tier, intro.value);
//!
//!     let links = resolver.resolve_links("Alan_Turing").await?;
//!     println!("links: {:?}", links.value);
//!
//!     let summary = resolver.resolve_summary("Alan_Turing", Level::Basic).await?;
//!     println!("{}", summary.value);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom collaborators
//!
//! Every tier is a trait object, so tests and embedders can swap any of
//! them:
//!
//! ```no_run
//! use std::sync::Arc;
//! use wikitutor_kb::{CacheConfig, MemoryCache, Resolver, SqliteStore, WikipediaClient};
//!
//! # fn example() -> wikitutor_kb::Result<()> {
//! let wikipedia = Arc::new(WikipediaClient::new(
//!     "https://en.wikipedia.org/w/api.php",
//!     "WikiTutorBot/1.0",
//! )?);
//!
//! let resolver = Resolver::builder()
//!     .cache(Arc::new(MemoryCache::new(CacheConfig::default())?))
//!     .store(Arc::new(SqliteStore::open_in_memory()?))
//!     .origin(wikipedia.clone())
//!     .link_source(wikipedia)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod origin;
pub mod resolve;
pub mod schema;
pub mod store;
pub mod summarize;
pub mod text;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheStats, InvalidationEvent, InvalidationReason,
    MemoryCache, RedisCache, ResourceKind, VolatileCache, MAX_TTL,
};
pub use config::{GeneratorConfig, KbConfig};
pub use error::{KbError, Result};
pub use origin::{FetchedArticle, LeadSection, LinkPolicy, LinkSource, OriginFetcher, WikipediaClient};
pub use resolve::{
    normalize_topic, FetchMode, Resolved, Resolver, ResolverBuilder, ResolverConfig, Tier,
};
pub use schema::{Article, Level, LinkSet, Summary, SummarySet};
pub use store::{HealthCheckConfig, HealthCheckResult, HealthStatus, PersistentStore, SqliteStore};
pub use summarize::{parse_summary_response, AnthropicClient, SummaryGenerator};
pub use text::normalize_text;
