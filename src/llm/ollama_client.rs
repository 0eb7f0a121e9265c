//! Ollama Client
//!
//! Non-streaming call to the Ollama chat API (`POST {base_url}/api/chat`).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::llm_client::LlmClient;

/// Ollama chat API client
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create with a shared HTTP client (its timeout bounds the call)
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

impl ChatResponse {
    /// `message.content`, else the last entry of `messages`; empty if neither
    fn into_content(self) -> String {
        self.message
            .or_else(|| self.messages.into_iter().last())
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.chat_url();
        debug!(url = %url, model = %self.model, "Calling Ollama");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": &self.model,
                "messages": [{"role": "user", "content": prompt}],
                "stream": false
            }))
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error {}: {}", status, body));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .context("Invalid Ollama response body")?;
        Ok(api_response.into_content())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }
}
