//! Cache key design for resolved resources
//!
//! Keys are namespaced by resource kind: `article:<topic>` holds intro
//! text, `links:<topic>` holds a JSON array of link titles. Summaries are
//! served from the persistent store only and have no cache key.

use crate::cache::types::{CacheKey, CacheValue};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Resource kinds mirrored in the volatile cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Article intro text
    Article,
    /// Internal link list
    Links,
}

impl ResourceKind {
    /// Every cached kind; `invalidate` clears one key per entry
    pub const CACHED: [ResourceKind; 2] = [ResourceKind::Article, ResourceKind::Links];

    /// Key namespace prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::Article => "article",
            ResourceKind::Links => "links",
        }
    }

    /// Build the cache key for a topic
    pub fn key(&self, topic: &str) -> CacheKey {
        format!("{}:{}", self.prefix(), topic)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// All cache keys belonging to a topic
pub fn topic_keys(topic: &str) -> Vec<CacheKey> {
    ResourceKind::CACHED.iter().map(|kind| kind.key(topic)).collect()
}

/// Serialize a link list into a cache value
pub fn encode_links(links: &[String]) -> Result<CacheValue> {
    Ok(serde_json::to_string(links)?)
}

/// Deserialize a cache value back into a link list
pub fn decode_links(value: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(value)?)
}
