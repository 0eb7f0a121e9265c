//! Generation backends
//!
//! The orchestrator only sees `LlmClient`; which implementation answers is
//! decided per request by `ProviderConfig::resolve` and a `ClientFactory`.

mod client_factory;
mod llm_client;
mod ollama_client;
mod provider;
mod sagemaker_client;

pub use client_factory::{ClientFactory, HttpClientFactory};
pub use llm_client::LlmClient;
pub use ollama_client::OllamaClient;
pub use provider::{BackendTarget, Provider, ProviderConfig, ProviderConfigError};
pub use sagemaker_client::{SageMakerClient, PLACEHOLDER_RESPONSE};
