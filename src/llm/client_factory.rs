//! Client construction per request
//!
//! Each plan request names its own backend, so clients are built on demand
//! from a resolved `BackendTarget`. The HTTP connection pool is shared.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use super::llm_client::LlmClient;
use super::ollama_client::OllamaClient;
use super::provider::BackendTarget;
use super::sagemaker_client::SageMakerClient;

/// Builds an `LlmClient` for a resolved backend
pub trait ClientFactory: Send + Sync {
    fn create(&self, target: &BackendTarget) -> Arc<dyn LlmClient>;
}

/// Production factory: reqwest-backed clients with a bounded call timeout
#[derive(Clone)]
pub struct HttpClientFactory {
    http: reqwest::Client,
}

impl HttpClientFactory {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, target: &BackendTarget) -> Arc<dyn LlmClient> {
        match target {
            BackendTarget::Ollama { base_url, model } => {
                Arc::new(OllamaClient::new(self.http.clone(), base_url, model))
            }
            BackendTarget::Amazon { region, endpoint } => {
                Arc::new(SageMakerClient::new(region, endpoint))
            }
        }
    }
}
