//! Amazon SageMaker Client
//!
//! Placeholder backend: answers every prompt with a fixed one-step plan.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::llm_client::LlmClient;

/// Canned response returned until the runtime endpoint is wired in
pub const PLACEHOLDER_RESPONSE: &str =
    r#"JSON:[{"step": 1, "name": "agent hierarchy", "parameters": {"agent_id": "3945X"}}]"#;

#[derive(Debug, Clone)]
pub struct SageMakerClient {
    region: String,
    endpoint: String,
}

impl SageMakerClient {
    pub fn new(region: &str, endpoint: &str) -> Self {
        Self {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for SageMakerClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        // TODO: call SageMaker Runtime InvokeEndpoint with the prompt
        debug!(
            region = %self.region,
            endpoint = %self.endpoint,
            prompt_len = prompt.len(),
            "SageMaker placeholder returning canned plan"
        );
        Ok(PLACEHOLDER_RESPONSE.to_string())
    }

    fn model_name(&self) -> &str {
        &self.endpoint
    }

    fn provider_name(&self) -> &str {
        "Amazon SageMaker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::extract;

    #[tokio::test]
    async fn test_placeholder_plan_is_extractable() {
        let client = SageMakerClient::new("eu-west-1", "planner-endpoint");
        let raw = client.complete("anything").await.unwrap();
        let plan = extract(&raw);
        let steps = plan.steps().unwrap();
        assert_eq!(steps[0].name, "agent hierarchy");
        assert_eq!(steps[0].parameters["agent_id"], "3945X");
        assert_eq!(client.model_name(), "planner-endpoint");
    }
}
