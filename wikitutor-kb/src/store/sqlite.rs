//! SQLite-backed persistent store
//!
//! One connection guarded by a mutex; statements run on the blocking
//! thread pool. Every write runs in its own transaction; a failed statement
//! drops the transaction, which rolls it back and leaves the previously
//! stored rows intact.

use crate::error::{KbError, Result};
use crate::schema::{Article, Level, LinkSet, Summary, SummarySet, SCHEMA};
use crate::store::health::{HealthCheckConfig, HealthCheckResult};
use crate::store::PersistentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

const BACKEND: &str = "sqlite";

const UPSERT_ARTICLE: &str = r#"
INSERT INTO articles (topic, title, intro_text, retrieved_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (topic) DO UPDATE SET
    title = excluded.title,
    intro_text = excluded.intro_text,
    retrieved_at = excluded.retrieved_at
RETURNING id, topic, title, intro_text, retrieved_at
"#;

const UPSERT_LINKS: &str = r#"
INSERT INTO links (article_id, internal_links, retrieved_at)
VALUES (?1, ?2, ?3)
ON CONFLICT (article_id) DO UPDATE SET
    internal_links = excluded.internal_links,
    retrieved_at = excluded.retrieved_at
"#;

const UPSERT_SUMMARY: &str = r#"
INSERT INTO summaries (article_id, level, content, generated_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (article_id, level) DO UPDATE SET
    content = excluded.content,
    generated_at = excluded.generated_at
"#;

/// Relational store on a single SQLite database
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
    health_config: HealthCheckConfig,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                KbError::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        info!("Opening SQLite store at {}", path.display());
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite store");
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        for ddl in SCHEMA {
            conn.execute_batch(ddl)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
            health_config: HealthCheckConfig::default(),
        })
    }

    /// Replace the health check configuration
    pub fn with_health_config(mut self, config: HealthCheckConfig) -> Self {
        self.health_config = config;
        self
    }

    /// Database file, or `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| KbError::Storage("connection mutex poisoned".to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| KbError::Storage(format!("store task failed: {}", e)))?
    }
}

fn article_id(conn: &Connection, topic: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM articles WHERE topic = ?1",
            params![topic],
            |row| row.get(0),
        )
        .optional()?)
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        topic: row.get(1)?,
        title: row.get(2)?,
        intro_text: row.get(3)?,
        retrieved_at: row.get(4)?,
    })
}

fn count(conn: &Connection, table: &str) -> Option<u64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get::<_, i64>(0)
    })
    .ok()
    .map(|n| n as u64)
}

#[async_trait]
impl PersistentStore for SqliteStore {
    async fn upsert_article(&self, topic: &str, title: &str, intro_text: &str) -> Result<Article> {
        let (topic, title, intro_text) = (topic.to_string(), title.to_string(), intro_text.to_string());

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let article = tx.query_row(
                UPSERT_ARTICLE,
                params![topic, title, intro_text, Utc::now()],
                row_to_article,
            )?;
            tx.commit()?;

            debug!("Stored article '{}' (id {})", topic, article.id);
            Ok(article)
        })
        .await
    }

    async fn get_article(&self, topic: &str) -> Result<Option<Article>> {
        let topic = topic.to_string();

        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, topic, title, intro_text, retrieved_at FROM articles WHERE topic = ?1",
                    params![topic],
                    row_to_article,
                )
                .optional()?)
        })
        .await
    }

    async fn upsert_links(&self, topic: &str, links: &[String]) -> Result<LinkSet> {
        let json = serde_json::to_string(links)?;
        let topic = topic.to_string();
        let links = links.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id = article_id(&tx, &topic)?.ok_or_else(|| KbError::MissingArticle(topic.clone()))?;

            let now = Utc::now();
            tx.execute(UPSERT_LINKS, params![id, json, now])?;
            tx.commit()?;

            debug!("Stored {} links for '{}'", links.len(), topic);
            Ok(LinkSet {
                topic,
                internal_links: links,
                retrieved_at: now,
            })
        })
        .await
    }

    async fn get_links(&self, topic: &str) -> Result<Option<LinkSet>> {
        let key = topic.to_string();
        let row: Option<(String, DateTime<Utc>)> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT l.internal_links, l.retrieved_at FROM links l \
                         JOIN articles a ON a.id = l.article_id WHERE a.topic = ?1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?)
            })
            .await?;

        match row {
            Some((json, retrieved_at)) => Ok(Some(LinkSet {
                topic: topic.to_string(),
                internal_links: serde_json::from_str(&json)?,
                retrieved_at,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_summary(&self, topic: &str, level: Level, content: &str) -> Result<bool> {
        if content.trim().is_empty() {
            debug!("Skipping empty {} summary for '{}'", level, topic);
            return Ok(false);
        }

        let (topic, content) = (topic.to_string(), content.to_string());

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id = article_id(&tx, &topic)?.ok_or_else(|| KbError::MissingArticle(topic.clone()))?;
            tx.execute(UPSERT_SUMMARY, params![id, level.as_str(), content, Utc::now()])?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    async fn upsert_summaries(&self, topic: &str, summaries: &SummarySet) -> Result<usize> {
        let topic = topic.to_string();
        let summaries = summaries.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id = article_id(&tx, &topic)?.ok_or_else(|| KbError::MissingArticle(topic.clone()))?;

            let now = Utc::now();
            let mut written = 0;
            for (level, content) in summaries.non_empty() {
                tx.execute(UPSERT_SUMMARY, params![id, level.as_str(), content, now])?;
                written += 1;
            }
            tx.commit()?;

            info!("Stored {} summaries for '{}'", written, topic);
            Ok(written)
        })
        .await
    }

    async fn get_summary(&self, topic: &str, level: Level) -> Result<Option<Summary>> {
        let key = topic.to_string();
        let row: Option<(String, DateTime<Utc>)> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT s.content, s.generated_at FROM summaries s \
                         JOIN articles a ON a.id = s.article_id \
                         WHERE a.topic = ?1 AND s.level = ?2",
                        params![key, level.as_str()],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?)
            })
            .await?;

        Ok(row.map(|(content, generated_at)| Summary {
            topic: topic.to_string(),
            level,
            content,
            generated_at,
        }))
    }

    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let check = self
            .with_conn(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok((count(conn, "articles"), count(conn, "summaries")))
            })
            .await;

        match check {
            Ok((articles, summaries)) => HealthCheckResult::healthy(
                start.elapsed(),
                BACKEND,
                articles,
                summaries,
                self.health_config.degraded_threshold_ms,
            ),
            Err(e) => {
                warn!("Store health check failed: {}", e);
                HealthCheckResult::unhealthy(start.elapsed(), BACKEND, &e.to_string())
            }
        }
    }
}
