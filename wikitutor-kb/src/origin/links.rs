//! Link selection policy for lead sections

use crate::error::KbError;
use crate::origin::LeadSection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Which lead-section links count as an article's internal links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Every main-namespace link in the lead section
    #[serde(rename = "lead")]
    LeadSection,

    /// Only links whose title appears in the lead's plain text
    #[default]
    Referenced,
}

impl LinkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPolicy::LeadSection => "lead",
            LinkPolicy::Referenced => "referenced",
        }
    }
}

impl std::fmt::Display for LinkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkPolicy {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lead" | "lead_section" | "all" => Ok(LinkPolicy::LeadSection),
            "referenced" | "strict" => Ok(LinkPolicy::Referenced),
            other => Err(KbError::Config(format!(
                "unknown link policy '{}' (expected lead or referenced)",
                other
            ))),
        }
    }
}

/// Title carries a namespace prefix such as `File:` or `Category:`
fn is_namespaced(title: &str) -> bool {
    const NAMESPACES: [&str; 12] = [
        "file", "image", "category", "help", "template", "wikipedia", "portal", "talk",
        "special", "user", "module", "draft",
    ];

    match title.split_once(':') {
        Some((prefix, _)) => {
            let prefix = prefix.trim().to_lowercase();
            NAMESPACES.contains(&prefix.as_str()) || prefix.ends_with(" talk")
        }
        None => false,
    }
}

/// Apply `policy` to a lead section's links
///
/// Namespaced and self links are dropped and duplicates removed, keeping
/// first-seen order. Under [`LinkPolicy::Referenced`] a link survives only
/// if its title occurs in the plain text (case-insensitive).
pub fn select_links(section: &LeadSection, policy: LinkPolicy) -> Vec<String> {
    let own_title = section.title.trim().to_lowercase();
    let haystack = section.plain_text.to_lowercase();
    let mut seen = HashSet::new();

    section
        .links
        .iter()
        .map(|link| link.trim())
        .filter(|link| !link.is_empty() && !is_namespaced(link))
        .filter(|link| link.to_lowercase() != own_title)
        .filter(|link| match policy {
            LinkPolicy::LeadSection => true,
            LinkPolicy::Referenced => haystack.contains(&link.to_lowercase()),
        })
        .filter(|link| seen.insert(link.to_string()))
        .map(str::to_string)
        .collect()
}
