//! MediaWiki API client
//!
//! Two requests are used:
//! - `action=query&prop=extracts|info` for the plain-text intro and canonical title
//! - `action=parse&prop=links|text&section=0` for the lead section's links and HTML
//!
//! Each request is preceded by a fixed pacing delay, a courtesy throttle
//! toward the upstream service.

use crate::config::KbConfig;
use crate::error::{KbError, Result};
use crate::origin::{FetchedArticle, LeadSection, LinkSource, OriginFetcher};
use crate::text::normalize_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the MediaWiki action API
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    api_url: String,
    pacing: Duration,
}

impl WikipediaClient {
    /// Create a client for `api_url` sending `user_agent` on every request
    pub fn new(api_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            pacing: Duration::from_millis(100),
        })
    }

    /// Create a client from the knowledge base configuration
    pub fn from_config(config: &KbConfig) -> Result<Self> {
        Ok(Self::new(&config.wiki_api_url, &config.user_agent)?.with_pacing(config.origin_pacing))
    }

    /// Delay applied before each request
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get<T>(&self, topic: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| KbError::origin(topic, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Wikipedia API returned {} for '{}'", status, topic);
            return Err(KbError::origin(topic, format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KbError::origin(topic, format!("invalid API response: {}", e)))
    }
}

#[async_trait]
impl OriginFetcher for WikipediaClient {
    async fn fetch(&self, topic: &str) -> Result<FetchedArticle> {
        let query_title = topic.replace('_', " ");
        debug!("Fetching intro for '{}' from origin", query_title);

        let body: QueryResponse = self
            .get(
                &query_title,
                &[
                    ("action", "query"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("prop", "extracts|info"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", query_title.as_str()),
                ],
            )
            .await?;

        if let Some(error) = body.error {
            return Err(KbError::origin(&query_title, error.info));
        }

        let page = body
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| KbError::origin(&query_title, "page not found"))?;

        if page.missing || page.invalid {
            return Err(KbError::origin(&query_title, "page not found"));
        }

        let text = normalize_text(page.extract.as_deref().unwrap_or_default());
        if text.is_empty() {
            return Err(KbError::origin(&query_title, "page has no intro text"));
        }

        let title = page.title.unwrap_or(query_title);
        debug!("Origin resolved '{}' ({} chars)", title, text.len());
        Ok(FetchedArticle { title, text })
    }
}

#[async_trait]
impl LinkSource for WikipediaClient {
    async fn fetch_lead_section(&self, title: &str) -> Result<LeadSection> {
        let page = title.trim().replace('_', " ");
        debug!("Fetching lead section for '{}' from origin", page);

        let body: ParseResponse = self
            .get(
                &page,
                &[
                    ("action", "parse"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("prop", "links|text"),
                    ("section", "0"),
                    ("redirects", "1"),
                    ("page", page.as_str()),
                ],
            )
            .await?;

        if let Some(error) = body.error {
            return Err(KbError::origin(&page, error.info));
        }

        let parsed = body
            .parse
            .ok_or_else(|| KbError::origin(&page, "no parse result"))?;

        let links = parsed
            .links
            .into_iter()
            .filter(|link| link.ns == 0)
            .map(|link| link.title)
            .collect();

        Ok(LeadSection {
            title: parsed.title.unwrap_or(page),
            links,
            plain_text: normalize_text(&parsed.text.unwrap_or_default()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<QueryPage>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    title: Option<String>,
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParseBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    title: Option<String>,
    text: Option<String>,
    #[serde(default)]
    links: Vec<ParseLink>,
}

#[derive(Debug, Deserialize)]
struct ParseLink {
    ns: i64,
    title: String,
}
