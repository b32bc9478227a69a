//! API routes for the Wiki Tutor server

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use wikitutor_kb::{FetchMode, Level, Resolver, Tier};

use super::error::ApiError;

/// Links returned by `/topic` when `max_links` is not given
pub const DEFAULT_MAX_LINKS: usize = 5;

/// Application state
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

/// Root response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Topic query parameters
#[derive(Debug, Default, Deserialize)]
pub struct TopicQuery {
    pub max_links: Option<usize>,
    /// Skip cache and store, re-fetch from Wikipedia
    #[serde(default)]
    pub nocache: bool,
    /// Also resolve the intro of each returned link
    #[serde(default)]
    pub expand: bool,
}

/// Topic response
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicResponse {
    pub topic: String,
    /// Canonical article title, e.g. after a redirect
    pub title: String,
    pub intro_text: String,
    pub internal_links: Vec<String>,
    pub source: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_contents: Option<BTreeMap<String, String>>,
}

/// Summary query parameters
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub level: Option<String>,
}

/// Summary response
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub topic: String,
    pub level: Level,
    pub summary: String,
    pub source: Tier,
}

/// Cache invalidation response
#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub topic: String,
    pub invalidated: Vec<String>,
}

/// Liveness message
pub async fn home() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Wiki Tutor API is running!".to_string(),
    })
}

/// Health check endpoint, backed by the persistent store
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.resolver.store().health_check().await;
    let status = StatusCode::from_u16(result.status.to_http_status_code())
        .unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (status, Json(result))
}

/// Article intro and internal links of a topic
pub async fn get_topic(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Query(params): Query<TopicQuery>,
) -> Result<Json<TopicResponse>, ApiError> {
    let topic = wikitutor_kb::normalize_topic(&topic)?;
    let mode = if params.nocache {
        FetchMode::Refresh
    } else {
        FetchMode::Tiered
    };

    let article = state.resolver.resolve_article_with(&topic, mode).await?;
    let title = state.resolver.canonical_title(&topic).await?;

    // Links are a partial result: failure leaves the list empty
    let mut internal_links = match state.resolver.resolve_links_with(&topic, mode).await {
        Ok(links) => links.value,
        Err(e) => {
            warn!("No links for '{}': {}", topic, e);
            Vec::new()
        }
    };
    internal_links.truncate(params.max_links.unwrap_or(DEFAULT_MAX_LINKS));

    let link_contents = if params.expand {
        let mut contents = BTreeMap::new();
        for link in &internal_links {
            match state.resolver.resolve_article(link).await {
                Ok(resolved) => {
                    contents.insert(link.clone(), resolved.value);
                }
                Err(e) => debug!("Skipping link '{}': {}", link, e),
            }
        }
        Some(contents)
    } else {
        None
    };

    Ok(Json(TopicResponse {
        topic,
        title,
        intro_text: article.value,
        internal_links,
        source: article.tier,
        link_contents,
    }))
}

/// One reading-level summary of a topic
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let level: Level = params.level.as_deref().unwrap_or("basic").parse()?;
    let topic = wikitutor_kb::normalize_topic(&topic)?;

    let summary = state.resolver.resolve_summary(&topic, level).await?;

    Ok(Json(SummaryResponse {
        topic,
        level,
        summary: summary.value,
        source: summary.tier,
    }))
}

/// Drop a topic's volatile cache entries
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let topic = wikitutor_kb::normalize_topic(&topic)?;
    let event = state.resolver.invalidate(&topic).await?;

    Ok(Json(InvalidateResponse {
        topic,
        invalidated: event.keys,
    }))
}
