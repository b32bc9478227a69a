//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type: `<kind>:<topic>`
pub type CacheKey = String;

/// Cache value type: article text, or a JSON array of link titles
pub type CacheValue = String;

/// Statistics for the in-memory cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses (absent or expired)
    pub misses: u64,

    /// Number of entries currently in cache
    pub entries: usize,

    /// Total size of cached data in bytes
    pub size_bytes: usize,

    /// Number of entries dropped because their TTL ran out
    pub evictions_ttl: u64,

    /// Number of explicit deletions
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, size: {} bytes, expired: {}, invalidated: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.size_bytes,
            self.evictions_ttl,
            self.invalidations
        )
    }
}
