//! Integration tests for the resolution pipeline
//!
//! These tests drive the resolver with in-process collaborators:
//! - Stub origin, link source and generator that count their calls
//! - In-memory SQLite store (plus a write-failing wrapper)
//! - In-memory cache (plus an always-failing cache)

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wikitutor_kb::{
    parse_summary_response, Article, CacheConfig, FetchMode, FetchedArticle, HealthCheckResult,
    KbError, LeadSection, Level, LinkPolicy, LinkSet, LinkSource, MemoryCache, OriginFetcher,
    PersistentStore, Resolver, Result, SqliteStore, Summary, SummaryGenerator, SummarySet, Tier,
    VolatileCache, MAX_TTL,
};

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

struct StubOrigin {
    title: String,
    text: Mutex<String>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StubOrigin {
    fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: Mutex::new(text.to_string()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OriginFetcher for StubOrigin {
    async fn fetch(&self, topic: &str) -> Result<FetchedArticle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(KbError::OriginUnavailable {
                topic: topic.to_string(),
                reason: "stub offline".to_string(),
            });
        }
        Ok(FetchedArticle {
            title: self.title.clone(),
            text: self.text.lock().unwrap().clone(),
        })
    }
}

struct StubLinks {
    links: Vec<String>,
    plain_text: String,
    requested: Mutex<Vec<String>>,
}

impl StubLinks {
    fn new(links: &[&str], plain_text: &str) -> Self {
        Self {
            links: links.iter().map(|l| l.to_string()).collect(),
            plain_text: plain_text.to_string(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkSource for StubLinks {
    async fn fetch_lead_section(&self, title: &str) -> Result<LeadSection> {
        self.requested.lock().unwrap().push(title.to_string());
        Ok(LeadSection {
            title: title.to_string(),
            links: self.links.clone(),
            plain_text: self.plain_text.clone(),
        })
    }
}

/// Answers every generation with the same raw model output
struct StubGenerator {
    raw: String,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn raw(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryGenerator for StubGenerator {
    async fn generate(&self, _text: &str) -> Result<SummarySet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_summary_response(&self.raw)
    }
}

struct BrokenCache;

#[async_trait]
impl VolatileCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(KbError::Cache("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        Err(KbError::Cache("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(KbError::Cache("connection refused".to_string()))
    }
}

/// Reads pass through, every write fails
struct ReadOnlyStore(SqliteStore);

#[async_trait]
impl PersistentStore for ReadOnlyStore {
    async fn upsert_article(&self, _: &str, _: &str, _: &str) -> Result<Article> {
        Err(KbError::Storage("database is locked".to_string()))
    }

    async fn get_article(&self, topic: &str) -> Result<Option<Article>> {
        self.0.get_article(topic).await
    }

    async fn upsert_links(&self, _: &str, _: &[String]) -> Result<LinkSet> {
        Err(KbError::Storage("database is locked".to_string()))
    }

    async fn get_links(&self, topic: &str) -> Result<Option<LinkSet>> {
        self.0.get_links(topic).await
    }

    async fn upsert_summary(&self, _: &str, _: Level, _: &str) -> Result<bool> {
        Err(KbError::Storage("database is locked".to_string()))
    }

    async fn upsert_summaries(&self, _: &str, _: &SummarySet) -> Result<usize> {
        Err(KbError::Storage("database is locked".to_string()))
    }

    async fn get_summary(&self, topic: &str, level: Level) -> Result<Option<Summary>> {
        self.0.get_summary(topic, level).await
    }

    async fn health_check(&self) -> HealthCheckResult {
        self.0.health_check().await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const FULL_SET: &str = r#"{"basic":"b","intermediate":"i","advanced":"a"}"#;

struct Harness {
    resolver: Resolver,
    cache: Arc<MemoryCache>,
    store: Arc<SqliteStore>,
    origin: Arc<StubOrigin>,
    links: Arc<StubLinks>,
    generator: Arc<StubGenerator>,
}

fn harness_with(policy: LinkPolicy, generator_output: &str) -> Harness {
    let cache = Arc::new(MemoryCache::new(CacheConfig::default()).unwrap());
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let origin = Arc::new(StubOrigin::new("Alan Turing", "X"));
    let links = Arc::new(StubLinks::new(&["A", "B", "C"], "Text mentioning A and C."));
    let generator = Arc::new(StubGenerator::raw(generator_output));

    let resolver = Resolver::builder()
        .cache(cache.clone())
        .store(store.clone())
        .origin(origin.clone())
        .link_source(links.clone())
        .generator(generator.clone())
        .link_policy(policy)
        .build()
        .unwrap();

    Harness {
        resolver,
        cache,
        store,
        origin,
        links,
        generator,
    }
}

fn harness() -> Harness {
    harness_with(LinkPolicy::Referenced, FULL_SET)
}

// ---------------------------------------------------------------------------
// Article resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_article_origin_result_is_written_back() {
    let h = harness();

    let resolved = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(resolved.value, "X");
    assert_eq!(resolved.tier, Tier::Origin);

    let stored = h.store.get_article("T").await.unwrap().unwrap();
    assert_eq!(stored.intro_text, "X");
    assert_eq!(stored.title, "Alan Turing");

    assert_eq!(h.cache.get("article:T").await.unwrap(), Some("X".to_string()));
}

#[tokio::test]
async fn test_article_second_read_survives_origin_failure() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.origin.fail();

    let again = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(again.value, "X");
    assert_eq!(again.tier, Tier::Cache);
    assert_eq!(h.origin.calls(), 1);
}

#[tokio::test]
async fn test_article_store_hit_refills_cache() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.resolver.invalidate("T").await.unwrap();
    h.origin.fail();

    let from_store = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(from_store.tier, Tier::Store);
    assert_eq!(from_store.value, "X");
    assert_eq!(h.cache.get("article:T").await.unwrap(), Some("X".to_string()));

    let from_cache = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(from_cache.tier, Tier::Cache);
}

#[tokio::test]
async fn test_article_origin_failure_is_a_miss() {
    let h = harness();
    h.origin.fail();

    let err = h.resolver.resolve_article("Nowhere").await.unwrap_err();
    assert!(matches!(err, KbError::OriginUnavailable { .. }));
    assert!(err.is_miss());
    assert!(h.store.get_article("Nowhere").await.unwrap().is_none());
    assert_eq!(h.cache.len().await, 0);
}

#[tokio::test]
async fn test_topic_forms_share_entries() {
    let h = harness();

    h.resolver.resolve_article("Alan_Turing").await.unwrap();
    let again = h.resolver.resolve_article("  Alan Turing ").await.unwrap();

    assert_eq!(again.tier, Tier::Cache);
    assert_eq!(h.origin.calls(), 1);
    assert!(h.cache.lookup("article:Alan Turing").await.is_some());
}

#[tokio::test]
async fn test_empty_topic_is_rejected() {
    let h = harness();

    let err = h.resolver.resolve_article("   ").await.unwrap_err();
    assert!(matches!(err, KbError::InvalidTopic(_)));
    assert!(err.is_caller_error());
    assert_eq!(h.origin.calls(), 0);
}

#[tokio::test]
async fn test_refresh_refetches_and_writes_back() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.origin.set_text("X2");

    let cached = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(cached.value, "X");

    let refreshed = h
        .resolver
        .resolve_article_with("T", FetchMode::Refresh)
        .await
        .unwrap();
    assert_eq!(refreshed.value, "X2");
    assert_eq!(refreshed.tier, Tier::Origin);

    assert_eq!(h.store.get_article("T").await.unwrap().unwrap().intro_text, "X2");
    assert_eq!(h.cache.get("article:T").await.unwrap(), Some("X2".to_string()));
}

#[tokio::test]
async fn test_refresh_with_origin_down_is_a_miss() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.origin.fail();

    let err = h
        .resolver
        .resolve_article_with("T", FetchMode::Refresh)
        .await
        .unwrap_err();
    assert!(err.is_miss());
    // Previously stored value is intact
    assert_eq!(h.store.get_article("T").await.unwrap().unwrap().intro_text, "X");
}

// ---------------------------------------------------------------------------
// Degraded tiers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cache_failures_degrade_to_misses() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let origin = Arc::new(StubOrigin::new("T", "X"));
    let resolver = Resolver::builder()
        .cache(Arc::new(BrokenCache))
        .store(store.clone())
        .origin(origin.clone())
        .link_source(Arc::new(StubLinks::new(&["X"], "X")))
        .build()
        .unwrap();

    let first = resolver.resolve_article("T").await.unwrap();
    assert_eq!(first.tier, Tier::Origin);

    let second = resolver.resolve_article("T").await.unwrap();
    assert_eq!(second.tier, Tier::Store);
    assert_eq!(second.value, "X");

    let event = resolver.invalidate("T").await.unwrap();
    assert_eq!(event.len(), 2);
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn test_store_write_failure_still_returns_value() {
    let cache = Arc::new(MemoryCache::new(CacheConfig::default()).unwrap());
    let resolver = Resolver::builder()
        .cache(cache.clone())
        .store(Arc::new(ReadOnlyStore(SqliteStore::open_in_memory().unwrap())))
        .origin(Arc::new(StubOrigin::new("T", "X")))
        .link_source(Arc::new(StubLinks::new(&["A"], "A")))
        .generator(Arc::new(StubGenerator::raw(FULL_SET)))
        .build()
        .unwrap();

    let article = resolver.resolve_article("T").await.unwrap();
    assert_eq!(article.value, "X");
    assert_eq!(cache.get("article:T").await.unwrap(), Some("X".to_string()));

    let links = resolver.resolve_links("T").await.unwrap();
    assert_eq!(links.value, vec!["A"]);

    let summary = resolver.resolve_summary("T", Level::Advanced).await.unwrap();
    assert_eq!(summary.value, "a");
}

// ---------------------------------------------------------------------------
// Link resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_links_referenced_policy_filters_by_text() {
    let h = harness();

    let resolved = h.resolver.resolve_links("T").await.unwrap();
    assert_eq!(resolved.value, vec!["A", "C"]);
    assert_eq!(resolved.tier, Tier::Origin);

    let stored = h.store.get_links("T").await.unwrap().unwrap();
    assert_eq!(stored.internal_links, vec!["A", "C"]);
    assert_eq!(
        h.cache.get("links:T").await.unwrap(),
        Some(r#"["A","C"]"#.to_string())
    );
}

#[tokio::test]
async fn test_links_lead_section_policy_keeps_all() {
    let h = harness_with(LinkPolicy::LeadSection, FULL_SET);

    let resolved = h.resolver.resolve_links("T").await.unwrap();
    assert_eq!(resolved.value, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_canonical_title_prefers_stored_title() {
    let h = harness();

    assert_eq!(h.resolver.canonical_title("turing_machine").await.unwrap(), "turing machine");

    h.resolver.resolve_article("turing_machine").await.unwrap();
    assert_eq!(h.resolver.canonical_title(" turing machine ").await.unwrap(), "Alan Turing");
    assert!(matches!(
        h.resolver.canonical_title("  ").await,
        Err(KbError::InvalidTopic(_))
    ));
}

#[tokio::test]
async fn test_links_resolve_article_first_and_use_canonical_title() {
    let h = harness();

    h.resolver.resolve_links("Turing").await.unwrap();

    assert_eq!(h.origin.calls(), 1);
    assert!(h.store.get_article("Turing").await.unwrap().is_some());
    assert_eq!(h.links.requested(), vec!["Alan Turing"]);
}

#[tokio::test]
async fn test_links_tiers() {
    let h = harness();

    h.resolver.resolve_links("T").await.unwrap();

    let cached = h.resolver.resolve_links("T").await.unwrap();
    assert_eq!(cached.tier, Tier::Cache);

    h.resolver.invalidate("T").await.unwrap();
    let stored = h.resolver.resolve_links("T").await.unwrap();
    assert_eq!(stored.tier, Tier::Store);
    assert_eq!(stored.value, vec!["A", "C"]);

    assert_eq!(h.links.requested().len(), 1);
}

#[tokio::test]
async fn test_links_undecodable_cache_value_is_a_miss() {
    let h = harness();

    h.resolver.resolve_links("T").await.unwrap();
    h.cache
        .set("links:T", "not json".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    let resolved = h.resolver.resolve_links("T").await.unwrap();
    assert_eq!(resolved.tier, Tier::Store);
    assert_eq!(resolved.value, vec!["A", "C"]);
}

#[tokio::test]
async fn test_links_origin_failure_is_a_miss() {
    let h = harness();
    h.origin.fail();

    let err = h.resolver.resolve_links("T").await.unwrap_err();
    assert!(err.is_miss());
    assert!(h.links.requested().is_empty());
}

// ---------------------------------------------------------------------------
// Summary resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_summary_generation_persists_all_levels() {
    let h = harness();

    let resolved = h.resolver.resolve_summary("T", Level::Basic).await.unwrap();
    assert_eq!(resolved.value, "b");
    assert_eq!(resolved.tier, Tier::Origin);

    let health = h.store.health_check().await;
    assert_eq!(health.summaries, Some(3));
    for (level, text) in [(Level::Basic, "b"), (Level::Intermediate, "i"), (Level::Advanced, "a")] {
        let stored = h.store.get_summary("T", level).await.unwrap().unwrap();
        assert_eq!(stored.content, text);
    }
}

#[tokio::test]
async fn test_summary_other_levels_served_from_store() {
    let h = harness();

    h.resolver.resolve_summary("T", Level::Basic).await.unwrap();
    let advanced = h.resolver.resolve_summary("T", Level::Advanced).await.unwrap();

    assert_eq!(advanced.value, "a");
    assert_eq!(advanced.tier, Tier::Store);
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_summary_missing_key_stores_nothing() {
    let h = harness_with(LinkPolicy::Referenced, r#"{"basic":"b","intermediate":"i"}"#);

    let err = h.resolver.resolve_summary("T", Level::Basic).await.unwrap_err();
    assert!(matches!(err, KbError::MalformedGeneratorResponse(_)));
    assert!(err.is_miss());

    assert_eq!(h.store.health_check().await.summaries, Some(0));
}

#[tokio::test]
async fn test_summary_empty_level_is_skipped() {
    let h = harness_with(
        LinkPolicy::Referenced,
        r#"{"basic":"","intermediate":"i","advanced":"a"}"#,
    );

    let err = h.resolver.resolve_summary("T", Level::Basic).await.unwrap_err();
    assert!(matches!(err, KbError::SummaryUnavailable { .. }));

    assert_eq!(h.store.health_check().await.summaries, Some(2));
    assert!(h.store.get_summary("T", Level::Basic).await.unwrap().is_none());
    assert!(h.store.get_summary("T", Level::Intermediate).await.unwrap().is_some());
}

#[tokio::test]
async fn test_summary_uses_cached_article() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.origin.fail();

    let resolved = h.resolver.resolve_summary("T", Level::Intermediate).await.unwrap();
    assert_eq!(resolved.value, "i");
    assert_eq!(h.origin.calls(), 1);
}

#[tokio::test]
async fn test_summary_article_miss_skips_generation() {
    let h = harness();
    h.origin.fail();

    let err = h.resolver.resolve_summary("T", Level::Basic).await.unwrap_err();
    assert!(matches!(err, KbError::OriginUnavailable { .. }));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_summary_of_cache_only_article_stores_article_first() {
    let h = harness();

    // Article known to the cache only
    h.cache
        .set("article:T", "X".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    let resolved = h.resolver.resolve_summary("T", Level::Basic).await.unwrap();
    assert_eq!(resolved.value, "b");
    assert_eq!(resolved.tier, Tier::Origin);
    assert_eq!(h.origin.calls(), 0);

    let article = h.store.get_article("T").await.unwrap().unwrap();
    assert_eq!(article.intro_text, "X");
    assert_eq!(h.store.health_check().await.summaries, Some(3));

    let again = h.resolver.resolve_summary("T", Level::Advanced).await.unwrap();
    assert_eq!(again.tier, Tier::Store);
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_summary_level_by_name() {
    let h = harness();

    let resolved = h.resolver.resolve_summary_named("T", "Advanced").await.unwrap();
    assert_eq!(resolved.value, "a");

    let err = h.resolver.resolve_summary_named("T", "expert").await.unwrap_err();
    assert!(matches!(err, KbError::InvalidLevel(_)));
}

#[tokio::test]
async fn test_summary_without_generator_serves_stored_only() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store.upsert_article("T", "T", "X").await.unwrap();
    store.upsert_summary("T", Level::Basic, "stored b").await.unwrap();

    let resolver = Resolver::builder()
        .cache(Arc::new(MemoryCache::new(CacheConfig::default()).unwrap()))
        .store(store)
        .origin(Arc::new(StubOrigin::new("T", "X")))
        .link_source(Arc::new(StubLinks::new(&[], "")))
        .build()
        .unwrap();

    let basic = resolver.resolve_summary("T", Level::Basic).await.unwrap();
    assert_eq!(basic.value, "stored b");

    let err = resolver.resolve_summary("T", Level::Advanced).await.unwrap_err();
    assert!(matches!(err, KbError::Config(_)));
}

#[test]
fn test_builder_rejects_out_of_range_ttl() {
    let builder = |ttl: Duration| {
        Resolver::builder()
            .cache(Arc::new(MemoryCache::new(CacheConfig::default()).unwrap()))
            .store(Arc::new(SqliteStore::open_in_memory().unwrap()))
            .origin(Arc::new(StubOrigin::new("T", "X")))
            .link_source(Arc::new(StubLinks::new(&[], "")))
            .cache_ttl(ttl)
            .build()
    };

    assert!(matches!(builder(Duration::ZERO), Err(KbError::Config(_))));
    assert!(matches!(
        builder(Duration::from_secs(10_000_000_000_000)),
        Err(KbError::Config(_))
    ));
    assert!(matches!(builder(Duration::MAX), Err(KbError::Config(_))));
    assert!(builder(MAX_TTL).is_ok());
}

#[tokio::test]
async fn test_longest_ttl_caches_after_origin_fetch() {
    let cache = Arc::new(MemoryCache::new(CacheConfig::default()).unwrap());
    let resolver = Resolver::builder()
        .cache(cache.clone())
        .store(Arc::new(SqliteStore::open_in_memory().unwrap()))
        .origin(Arc::new(StubOrigin::new("T", "X")))
        .link_source(Arc::new(StubLinks::new(&[], "")))
        .cache_ttl(MAX_TTL)
        .build()
        .unwrap();

    assert_eq!(resolver.resolve_article("T").await.unwrap().tier, Tier::Origin);
    assert_eq!(resolver.resolve_article("T").await.unwrap().tier, Tier::Cache);
}

// ---------------------------------------------------------------------------
// Invalidation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_invalidate_forces_reread_and_keeps_store() {
    let h = harness();

    h.resolver.resolve_article("T").await.unwrap();
    h.cache
        .set("article:T", "stale".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(h.resolver.resolve_article("T").await.unwrap().value, "stale");

    let event = h.resolver.invalidate("T").await.unwrap();
    assert_eq!(event.keys, vec!["article:T", "links:T"]);

    let resolved = h.resolver.resolve_article("T").await.unwrap();
    assert_eq!(resolved.value, "X");
    assert_eq!(resolved.tier, Tier::Store);
    assert_eq!(h.store.get_article("T").await.unwrap().unwrap().intro_text, "X");
}

#[tokio::test]
async fn test_invalidate_unknown_topic_is_ok() {
    let h = harness();

    let event = h.resolver.invalidate("Never seen").await.unwrap();
    assert_eq!(event.len(), 2);
    assert!(h.resolver.invalidate(" ").await.is_err());
}

#[tokio::test]
async fn test_invalidate_leaves_summaries() {
    let h = harness();

    h.resolver.resolve_summary("T", Level::Basic).await.unwrap();
    h.resolver.invalidate("T").await.unwrap();

    let again = h.resolver.resolve_summary("T", Level::Basic).await.unwrap();
    assert_eq!(again.tier, Tier::Store);
    assert_eq!(h.generator.calls(), 1);
}
