//! Error types for knowledge base operations
//!
//! This module defines the error taxonomy shared by the cache, store,
//! origin and generator layers, and by the resolution pipeline on top of them.

use thiserror::Error;

/// Main error type for knowledge base operations
#[derive(Error, Debug)]
pub enum KbError {
    /// Upstream article source failed or has no such page
    #[error("Origin unavailable for '{topic}': {reason}")]
    OriginUnavailable { topic: String, reason: String },

    /// Generator answered, but not with the expected JSON object
    #[error("Malformed generator response: {0}")]
    MalformedGeneratorResponse(String),

    /// Generator call itself failed (transport, status, auth)
    #[error("Generator error: {0}")]
    Generator(String),

    /// Generation succeeded but produced no text for this level
    #[error("No {level} summary available for '{topic}'")]
    SummaryUnavailable { topic: String, level: String },

    /// Persistence layer rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// A write needs an Article row that does not exist
    #[error("No stored article for '{0}'")]
    MissingArticle(String),

    /// Volatile cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Level outside basic/intermediate/advanced
    #[error("Invalid summary level '{0}' (expected basic, intermediate or advanced)")]
    InvalidLevel(String),

    /// Empty or whitespace-only topic
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type alias for knowledge base operations
pub type Result<T> = std::result::Result<T, KbError>;

impl KbError {
    /// Whether this error is a resolution miss: every tier was consulted
    /// and none could produce the resource.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            KbError::OriginUnavailable { .. }
                | KbError::MalformedGeneratorResponse(_)
                | KbError::Generator(_)
                | KbError::SummaryUnavailable { .. }
        )
    }

    /// Whether the caller supplied an unusable argument
    pub fn is_caller_error(&self) -> bool {
        matches!(self, KbError::InvalidLevel(_) | KbError::InvalidTopic(_))
    }

    pub(crate) fn origin(topic: &str, reason: impl Into<String>) -> Self {
        KbError::OriginUnavailable {
            topic: topic.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for KbError {
    fn from(e: rusqlite::Error) -> Self {
        KbError::Storage(e.to_string())
    }
}

impl From<redis::RedisError> for KbError {
    fn from(e: redis::RedisError) -> Self {
        KbError::Cache(e.to_string())
    }
}

impl From<serde_json::Error> for KbError {
    fn from(e: serde_json::Error) -> Self {
        KbError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for KbError {
    fn from(e: reqwest::Error) -> Self {
        KbError::Http(e.to_string())
    }
}
