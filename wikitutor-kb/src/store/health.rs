//! Persistent store health checks
//!
//! A health check runs a trivial round trip against the store, times it,
//! and reports row counts. Slow but successful round trips are `Degraded`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for health check behavior
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Response time threshold for degraded state (in milliseconds)
    pub degraded_threshold_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            degraded_threshold_ms: 1000,
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store is healthy and responsive
    Healthy,
    /// Store is responsive but slow (above degraded threshold)
    Degraded,
    /// Store is not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Convert to HTTP status code equivalent
    pub fn to_http_status_code(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Degraded => 200,
            HealthStatus::Unhealthy => 503,
        }
    }

    /// Check if status is healthy or degraded (operational)
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Overall health status
    pub status: HealthStatus,
    /// Response time in milliseconds
    pub response_time_ms: u64,
    /// Store backend name (e.g. "sqlite")
    pub backend: String,
    /// Stored article count (if the count query succeeded)
    pub articles: Option<u64>,
    /// Stored summary row count (if the count query succeeded)
    pub summaries: Option<u64>,
    /// Timestamp of the health check
    pub timestamp: DateTime<Utc>,
    /// Error message (if unhealthy)
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// Create a healthy (or degraded, if slow) result
    pub fn healthy(
        response_time: Duration,
        backend: &str,
        articles: Option<u64>,
        summaries: Option<u64>,
        degraded_threshold_ms: u64,
    ) -> Self {
        let response_time_ms = response_time.as_millis() as u64;
        let status = if response_time_ms > degraded_threshold_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            response_time_ms,
            backend: backend.to_string(),
            articles,
            summaries,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Create an unhealthy result
    pub fn unhealthy(response_time: Duration, backend: &str, error: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: response_time.as_millis() as u64,
            backend: backend.to_string(),
            articles: None,
            summaries: None,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}
