//! Tiered summary generation
//!
//! A [`SummaryGenerator`] turns article text into all three reading levels
//! in a single call. Responses are parsed by [`parse_summary_response`],
//! which accepts only a JSON object with exactly the `basic`,
//! `intermediate` and `advanced` keys.

pub mod anthropic;
pub mod prompt;

use crate::error::{KbError, Result};
use crate::schema::{Level, SummarySet};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub use anthropic::AnthropicClient;
pub use prompt::{build_summary_prompt, level_instruction};

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F]+").unwrap());

/// Produces summaries at every [`Level`] from one piece of text
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// One generation call covering all levels; never per level
    async fn generate(&self, text: &str) -> Result<SummarySet>;
}

/// Slice from the first `{` to the last `}` with control characters
/// replaced by spaces
pub fn extract_json(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(CONTROL_CHARS.replace_all(&raw[start..=end], " ").into_owned())
}

/// Parse a generator's raw text into a [`SummarySet`]
///
/// Any deviation (no object, invalid JSON, a missing, extra or non-string
/// key) fails the whole response with
/// [`KbError::MalformedGeneratorResponse`]. Empty strings are accepted
/// here; they are simply not stored.
pub fn parse_summary_response(raw: &str) -> Result<SummarySet> {
    let json = extract_json(raw).ok_or_else(|| {
        KbError::MalformedGeneratorResponse("no JSON object found in response".to_string())
    })?;

    let value: Value = serde_json::from_str(&json)
        .map_err(|e| KbError::MalformedGeneratorResponse(format!("invalid JSON: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        KbError::MalformedGeneratorResponse("response is not a JSON object".to_string())
    })?;

    if let Some(extra) = object
        .keys()
        .find(|key| Level::ALL.iter().all(|level| level.as_str() != key.as_str()))
    {
        return Err(KbError::MalformedGeneratorResponse(format!(
            "unexpected key '{}'",
            extra
        )));
    }

    let text_for = |level: Level| -> Result<String> {
        match object.get(level.as_str()) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(KbError::MalformedGeneratorResponse(format!(
                "'{}' is not a string: {}",
                level, other
            ))),
            None => Err(KbError::MalformedGeneratorResponse(format!(
                "missing '{}' summary",
                level
            ))),
        }
    };

    Ok(SummarySet::new(
        text_for(Level::Basic)?,
        text_for(Level::Intermediate)?,
        text_for(Level::Advanced)?,
    ))
}
