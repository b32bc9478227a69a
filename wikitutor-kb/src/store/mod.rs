//! # Persistent Store
//!
//! Durable keyed storage for articles, links and summaries. The store is the
//! source of truth behind the volatile cache: articles and link sets are
//! keyed by topic, summaries by topic and level.
//!
//! Writes are idempotent upserts keyed by topic, so concurrent resolutions of
//! the same topic converge on one row instead of failing. Writes that need an
//! article row (links, summaries) fail with [`KbError::MissingArticle`]
//! rather than creating orphans.
//!
//! [`KbError::MissingArticle`]: crate::error::KbError::MissingArticle

pub mod health;
pub mod sqlite;

pub use health::{HealthCheckConfig, HealthCheckResult, HealthStatus};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::schema::{Article, Level, LinkSet, Summary, SummarySet};
use async_trait::async_trait;

/// Durable storage consulted after a volatile cache miss
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Insert the article, or replace title and text if the topic exists.
    /// Returns the row as written.
    async fn upsert_article(&self, topic: &str, title: &str, intro_text: &str) -> Result<Article>;

    async fn get_article(&self, topic: &str) -> Result<Option<Article>>;

    /// Replace the link set of an existing article
    async fn upsert_links(&self, topic: &str, links: &[String]) -> Result<LinkSet>;

    async fn get_links(&self, topic: &str) -> Result<Option<LinkSet>>;

    /// Store one summary level. Empty content is skipped and yields `Ok(false)`.
    async fn upsert_summary(&self, topic: &str, level: Level, content: &str) -> Result<bool>;

    /// Store every non-empty level of a set in one transaction.
    /// Returns the number of rows written.
    async fn upsert_summaries(&self, topic: &str, summaries: &SummarySet) -> Result<usize>;

    async fn get_summary(&self, topic: &str, level: Level) -> Result<Option<Summary>>;

    /// Round-trip check; never fails, reports problems in the result
    async fn health_check(&self) -> HealthCheckResult;
}
