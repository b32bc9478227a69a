//! Configuration for the in-memory cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default entry lifetime: 24 hours
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Longest accepted entry lifetime: 365 days
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

/// Configuration for [`MemoryCache`](crate::cache::MemoryCache)
///
/// Entries live for a fixed TTL and are never evicted early. `max_entries`
/// is a soft capacity: going over it is logged, not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL used by `insert` when the caller gives none
    pub default_ttl: Duration,

    /// Soft capacity, warned about when exceeded
    pub max_entries: usize,

    /// Enable automatic cleanup of expired entries
    pub enable_auto_cleanup: bool,

    /// Interval for automatic cleanup checks
    pub cleanup_interval: Duration,

    /// Enable size/entry accounting in [`CacheStats`](crate::cache::CacheStats)
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_entries: 10_000,
            enable_auto_cleanup: true,
            // Cleanup every 5 minutes
            cleanup_interval: Duration::from_secs(300),
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if self.default_ttl > MAX_TTL {
            return Err(format!(
                "default_ttl must be at most {} seconds",
                MAX_TTL.as_secs()
            ));
        }

        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err("cleanup_interval must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the soft entry capacity
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_entries, 10_000);
        assert!(config.enable_auto_cleanup);
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::default().validate().is_ok());

        let invalid = CacheConfig::builder().default_ttl(Duration::ZERO).build();
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder()
            .default_ttl(MAX_TTL + Duration::from_secs(1))
            .build();
        assert!(invalid.validate().is_err());
        assert!(CacheConfig::builder().default_ttl(MAX_TTL).build().validate().is_ok());

        let invalid = CacheConfig::builder().max_entries(0).build();
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder()
            .enable_auto_cleanup(true)
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(600))
            .max_entries(5000)
            .enable_metrics(false)
            .build();

        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.max_entries, 5000);
        assert!(!config.enable_metrics);
    }
}
