//! Type definitions for stored knowledge base rows

use crate::error::KbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading-difficulty tier of a generated summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Young learners, grades 3-5
    Basic,
    /// High school readers, grades 9-12
    Intermediate,
    /// Master's degree readers
    Advanced,
}

impl Level {
    /// All levels, in the order they are generated and stored
    pub const ALL: [Level; 3] = [Level::Basic, Level::Intermediate, Level::Advanced];

    /// Convert level to its storage / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Basic => "basic",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Level::Basic),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            _ => Err(KbError::InvalidLevel(s.to_string())),
        }
    }
}

/// Article row: the normalized intro text of one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Row identifier
    pub id: i64,
    /// Topic as requested (the natural key)
    pub topic: String,
    /// Canonical title reported by the origin, after redirects
    pub title: String,
    /// Normalized intro text
    pub intro_text: String,
    /// When the text was last fetched from the origin
    pub retrieved_at: DateTime<Utc>,
}

/// Internal links discovered in a topic's lead section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSet {
    /// Topic of the owning article
    pub topic: String,
    /// Link targets in discovery order, without duplicates
    pub internal_links: Vec<String>,
    pub retrieved_at: DateTime<Utc>,
}

/// One stored summary level of a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub topic: String,
    pub level: Level,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

/// All three summary levels produced by a single generator call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySet {
    pub basic: String,
    pub intermediate: String,
    pub advanced: String,
}

impl SummarySet {
    /// Create a summary set from its three texts
    pub fn new(
        basic: impl Into<String>,
        intermediate: impl Into<String>,
        advanced: impl Into<String>,
    ) -> Self {
        Self {
            basic: basic.into(),
            intermediate: intermediate.into(),
            advanced: advanced.into(),
        }
    }

    /// Text for one level (may be empty)
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Basic => &self.basic,
            Level::Intermediate => &self.intermediate,
            Level::Advanced => &self.advanced,
        }
    }

    /// Levels whose text is non-empty after trimming; only these are persisted
    pub fn non_empty(&self) -> impl Iterator<Item = (Level, &str)> + '_ {
        Level::ALL
            .into_iter()
            .map(move |level| (level, self.get(level)))
            .filter(|(_, text)| !text.trim().is_empty())
    }
}
