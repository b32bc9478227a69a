//! Internal link resolution

use super::{normalize_topic, FetchMode, Resolved, Resolver, Tier};
use crate::cache::{decode_links, encode_links, ResourceKind};
use crate::error::Result;
use tracing::{debug, warn};

impl Resolver {
    /// Internal links of `topic` in first-seen order
    pub async fn resolve_links(&self, topic: &str) -> Result<Resolved<Vec<String>>> {
        self.resolve_links_with(topic, FetchMode::Tiered).await
    }

    pub async fn resolve_links_with(
        &self,
        topic: &str,
        mode: FetchMode,
    ) -> Result<Resolved<Vec<String>>> {
        let topic = normalize_topic(topic)?;
        let key = ResourceKind::Links.key(&topic);

        if mode == FetchMode::Tiered {
            if let Some(raw) = self.cache_get(&key).await {
                match decode_links(&raw) {
                    Ok(links) => {
                        debug!("Links for '{}' served from cache", topic);
                        return Ok(Resolved::new(links, Tier::Cache));
                    }
                    Err(e) => warn!("Discarding undecodable cache value {}: {}", key, e),
                }
            }

            match self.store.get_links(&topic).await {
                Ok(Some(set)) => {
                    debug!("Links for '{}' served from store", topic);
                    self.cache_links(&key, &set.internal_links).await;
                    return Ok(Resolved::new(set.internal_links, Tier::Store));
                }
                Ok(None) => {}
                Err(e) => warn!("Store read failed for links '{}', treating as miss: {}", topic, e),
            }
        }

        // The article row must exist before links can hang off it
        let title = match self.stored_article(&topic).await {
            Some(article) => article.title,
            None => self.fetch_article(&topic).await?.title,
        };

        let links = self
            .link_source
            .fetch_lead_links(&title, self.config.link_policy)
            .await
            .map_err(|e| {
                warn!("Link fetch failed for '{}': {}", title, e);
                e
            })?;
        debug!(
            "Fetched {} links for '{}' ({} policy)",
            links.len(),
            topic,
            self.config.link_policy
        );

        if let Err(e) = self.store.upsert_links(&topic, &links).await {
            warn!("Failed to persist links for '{}': {}", topic, e);
        }
        self.cache_links(&key, &links).await;

        Ok(Resolved::new(links, Tier::Origin))
    }

    async fn cache_links(&self, key: &str, links: &[String]) {
        match encode_links(links) {
            Ok(value) => self.cache_put(key, value).await,
            Err(e) => warn!("Could not encode links for {}: {}", key, e),
        }
    }
}
