//! Knowledge base schema module
//!
//! Row types for articles, link sets and summaries, plus the relational
//! schema the SQLite store creates on open. A summary row always hangs off
//! an article row; links are one row per article.

pub mod types;

pub use types::{Article, Level, LinkSet, Summary, SummarySet};

/// Articles keyed by the requested topic
pub const CREATE_ARTICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    intro_text TEXT NOT NULL,
    retrieved_at TEXT NOT NULL
)
"#;

/// Internal links, stored as a JSON array per article
pub const CREATE_LINKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL UNIQUE,
    internal_links TEXT NOT NULL,
    retrieved_at TEXT NOT NULL,
    FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE
)
"#;

pub const CREATE_SUMMARIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL,
    level TEXT NOT NULL,
    content TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE,
    UNIQUE (article_id, level)
)
"#;

/// Every DDL statement, in dependency order
pub const SCHEMA: [&str; 3] = [
    CREATE_ARTICLES_TABLE,
    CREATE_LINKS_TABLE,
    CREATE_SUMMARIES_TABLE,
];
