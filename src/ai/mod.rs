//! AI model client used for report prose.
//!
//! `ReportModel` is the seam: the daemon talks to the Anthropic messages API
//! when an API key is configured, and falls back to the deterministic
//! `StaticModel` otherwise (and in tests).

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::AiConfig;

pub type SharedModel = Arc<dyn ReportModel>;

#[async_trait]
pub trait ReportModel: Send + Sync {
    /// Generate one prose section from a prompt. Errors abort report
    /// generation — a report is never emitted with missing prose.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short identifier recorded in logs.
    fn name(&self) -> &str;
}

/// Build the model from config: Anthropic client when a key is present,
/// static prose otherwise.
pub fn from_config(config: &AiConfig) -> Result<SharedModel> {
    match config.resolved_api_key() {
        Some(key) => Ok(Arc::new(AnthropicModel::new(config, key)?)),
        None => {
            tracing::warn!("no AI API key configured — reports will use canned prose");
            Ok(Arc::new(StaticModel))
        }
    }
}

// ─── AnthropicModel ──────────────────────────────────────────────────────────

pub struct AnthropicModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicModel {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ReportModel for AnthropicModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, "requesting report section");
        let resp = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await
            .context("AI model request failed")?
            .error_for_status()
            .context("AI model returned an error status")?;

        let body: MessagesResponse = resp.json().await.context("decode AI model response")?;
        let text = body
            .content
            .iter()
            .find(|b| b.kind == "text")
            .map(|b| b.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("AI model response contained no text"))?;
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ─── StaticModel ─────────────────────────────────────────────────────────────

/// Deterministic stand-in used without an API key and by tests.
pub struct StaticModel;

#[async_trait]
impl ReportModel for StaticModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        // The first prompt line carries the section name (see report::prompts).
        let section = prompt.lines().next().unwrap_or("section");
        Ok(format!(
            "<p>[Automatically generated placeholder for: {}]</p>\
             <p>Configure an AI API key to replace this section with \
             model-authored analysis.</p>",
            section.trim()
        ))
    }

    fn name(&self) -> &str {
        "static"
    }
}
