//! Anthropic Messages API summary generator
//!
//! See: <https://docs.anthropic.com/en/api/messages>

use crate::config::{GeneratorConfig, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL};
use crate::error::{KbError, Result};
use crate::schema::SummarySet;
use crate::summarize::{build_summary_prompt, parse_summary_response, SummaryGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client with the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_ANTHROPIC_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: 4096,
        })
    }

    /// Build from configuration; the API key is required here
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| KbError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;

        Ok(Self::with_base_url(api_key, &config.base_url)?
            .with_model(&config.model)
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user message and return the concatenated text blocks
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model: &self.model,
                max_tokens: self.max_tokens,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await
            .map_err(|e| KbError::Generator(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Anthropic API returned {}: {}", status, body);
            return Err(KbError::Generator(format!("HTTP {}: {}", status, body)));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| KbError::Generator(format!("invalid API response: {}", e)))?;

        if let Some(usage) = &body.usage {
            info!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.input_tokens + usage.output_tokens,
                "Summary generation token usage"
            );
        }

        let text: String = body
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        debug!("Generator returned {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl SummaryGenerator for AnthropicClient {
    async fn generate(&self, text: &str) -> Result<SummarySet> {
        let prompt = build_summary_prompt(text);
        let raw = self.complete(&prompt).await?;

        parse_summary_response(&raw).map_err(|e| {
            warn!("Unparseable generator response: {}", e);
            e
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
