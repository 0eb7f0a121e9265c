//! LLM Client Trait
//!
//! Unified interface for the plan-drafting backends (Ollama, Amazon SageMaker).

use anyhow::Result;
use async_trait::async_trait;

/// One prompt in, raw generated text out
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single user prompt and return the raw response text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name for logging
    fn model_name(&self) -> &str;

    /// Get the provider name for logging
    fn provider_name(&self) -> &str;
}
