//! Summary resolution with generation on miss

use super::{normalize_topic, Resolved, Resolver, Tier};
use crate::error::{KbError, Result};
use crate::schema::{Level, SummarySet};
use tracing::{debug, warn};

impl Resolver {
    /// Summary of `topic` at `level`
    ///
    /// Summaries live in the store only. On a miss the article is resolved,
    /// all levels are generated in one call and every non-empty level is
    /// stored. A level the generator left empty is
    /// [`KbError::SummaryUnavailable`].
    pub async fn resolve_summary(&self, topic: &str, level: Level) -> Result<Resolved<String>> {
        let topic = normalize_topic(topic)?;

        match self.store.get_summary(&topic, level).await {
            Ok(Some(summary)) => {
                debug!("{} summary of '{}' served from store", level, topic);
                return Ok(Resolved::new(summary.content, Tier::Store));
            }
            Ok(None) => {}
            Err(e) => warn!("Store read failed for summary '{}', treating as miss: {}", topic, e),
        }

        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| KbError::Config("no summary generator configured".to_string()))?;

        let article = self.resolve_article(&topic).await?;

        let summaries = generator.generate(&article.value).await.map_err(|e| {
            warn!("Summary generation failed for '{}': {}", topic, e);
            e
        })?;

        self.persist_summaries(&topic, &article.value, &summaries).await;

        let text = summaries.get(level);
        if text.trim().is_empty() {
            return Err(KbError::SummaryUnavailable {
                topic,
                level: level.to_string(),
            });
        }
        Ok(Resolved::new(text.to_string(), Tier::Origin))
    }

    /// Store generated summaries, writing the article row first when the
    /// intro came from a cache that outlived the store. Failures are logged.
    async fn persist_summaries(&self, topic: &str, intro_text: &str, summaries: &SummarySet) {
        let result = match self.store.upsert_summaries(topic, summaries).await {
            Err(KbError::MissingArticle(_)) => {
                debug!("No stored article for '{}', storing intro before summaries", topic);
                match self.store.upsert_article(topic, topic, intro_text).await {
                    Ok(_) => self.store.upsert_summaries(topic, summaries).await,
                    Err(e) => Err(e),
                }
            }
            other => other,
        };

        match result {
            Ok(written) => debug!("Stored {} summary levels for '{}'", written, topic),
            Err(e) => warn!("Failed to persist summaries for '{}': {}", topic, e),
        }
    }

    /// Like [`resolve_summary`](Self::resolve_summary) with the level given by name
    pub async fn resolve_summary_named(&self, topic: &str, level: &str) -> Result<Resolved<String>> {
        let level: Level = level.parse()?;
        self.resolve_summary(topic, level).await
    }
}
