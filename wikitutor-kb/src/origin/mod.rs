//! Origin collaborators
//!
//! The last tier of resolution: the live encyclopedia. [`OriginFetcher`]
//! returns an article's canonical title and intro text, [`LinkSource`]
//! returns the lead section's links. [`WikipediaClient`] implements both
//! against the MediaWiki API.

pub mod links;
pub mod wikipedia;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use links::{select_links, LinkPolicy};
pub use wikipedia::WikipediaClient;

/// Article as returned by the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedArticle {
    /// Canonical title after redirects
    pub title: String,

    /// Normalized intro text
    pub text: String,
}

/// Rendered lead section of an article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSection {
    pub title: String,

    /// Main-namespace link targets in document order
    pub links: Vec<String>,

    /// Normalized plain text of the section
    pub plain_text: String,
}

/// Fetches article intro text from the origin
#[async_trait]
pub trait OriginFetcher: Send + Sync {
    /// Fetch `topic`; redirects are followed and the canonical title returned.
    /// Any failure is [`KbError::OriginUnavailable`](crate::KbError::OriginUnavailable).
    async fn fetch(&self, topic: &str) -> Result<FetchedArticle>;
}

/// Fetches the lead section of an article
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn fetch_lead_section(&self, title: &str) -> Result<LeadSection>;

    /// Lead-section links filtered by `policy`
    async fn fetch_lead_links(&self, title: &str, policy: LinkPolicy) -> Result<Vec<String>> {
        let section = self.fetch_lead_section(title).await?;
        Ok(select_links(&section, policy))
    }
}
