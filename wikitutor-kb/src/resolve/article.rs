//! Article resolution

use super::{normalize_topic, FetchMode, Resolved, Resolver, Tier};
use crate::cache::ResourceKind;
use crate::error::Result;
use crate::origin::FetchedArticle;
use crate::schema::Article;
use tracing::{debug, warn};

impl Resolver {
    /// Intro text of `topic`, served from the highest tier that has it
    pub async fn resolve_article(&self, topic: &str) -> Result<Resolved<String>> {
        self.resolve_article_with(topic, FetchMode::Tiered).await
    }

    pub async fn resolve_article_with(
        &self,
        topic: &str,
        mode: FetchMode,
    ) -> Result<Resolved<String>> {
        let topic = normalize_topic(topic)?;
        let key = ResourceKind::Article.key(&topic);

        if mode == FetchMode::Tiered {
            if let Some(text) = self.cache_get(&key).await {
                debug!("Article '{}' served from cache", topic);
                return Ok(Resolved::new(text, Tier::Cache));
            }

            if let Some(article) = self.stored_article(&topic).await {
                debug!("Article '{}' served from store", topic);
                self.cache_put(&key, article.intro_text.clone()).await;
                return Ok(Resolved::new(article.intro_text, Tier::Store));
            }
        }

        let fetched = self.fetch_article(&topic).await?;
        Ok(Resolved::new(fetched.text, Tier::Origin))
    }

    /// Canonical article title recorded for `topic`, or the normalized topic
    /// when the store has no row for it
    pub async fn canonical_title(&self, topic: &str) -> Result<String> {
        let topic = normalize_topic(topic)?;
        Ok(match self.stored_article(&topic).await {
            Some(article) => article.title,
            None => topic,
        })
    }

    /// Store lookup that degrades to a miss on error
    pub(super) async fn stored_article(&self, topic: &str) -> Option<Article> {
        match self.store.get_article(topic).await {
            Ok(article) => article,
            Err(e) => {
                warn!("Store read failed for article '{}', treating as miss: {}", topic, e);
                None
            }
        }
    }

    /// Fetch from the origin and write back to store and cache
    pub(super) async fn fetch_article(&self, topic: &str) -> Result<FetchedArticle> {
        let fetched = self.origin.fetch(topic).await.map_err(|e| {
            warn!("Origin fetch failed for '{}': {}", topic, e);
            e
        })?;
        debug!("Article '{}' fetched from origin as '{}'", topic, fetched.title);

        if let Err(e) = self
            .store
            .upsert_article(topic, &fetched.title, &fetched.text)
            .await
        {
            warn!("Failed to persist article '{}': {}", topic, e);
        }

        self.cache_put(&ResourceKind::Article.key(topic), fetched.text.clone())
            .await;
        Ok(fetched)
    }
}
