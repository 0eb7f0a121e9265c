//! Backend Selection
//!
//! Maps the request's `provider` name and `provider_config` fields onto a
//! concrete backend target. Missing connection fields are reported before
//! any backend is contacted.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generation backend provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Local or remote Ollama server
    Ollama,
    /// Amazon SageMaker endpoint
    Amazon,
}

impl Provider {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::Amazon => "Amazon",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Provider {
    type Err = ProviderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "amazon" | "sagemaker" | "aws" => Ok(Provider::Amazon),
            _ => Err(ProviderConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Provider selection that cannot be served.
///
/// The display text is what the caller sees in the error plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderConfigError {
    #[error("Missing Ollama config")]
    MissingOllama,

    #[error("Missing Amazon config")]
    MissingAmazon,

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),
}

/// Connection fields sent with a plan request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A provider with all of its connection fields present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    Ollama { base_url: String, model: String },
    Amazon { region: String, endpoint: String },
}

impl BackendTarget {
    pub fn provider(&self) -> Provider {
        match self {
            BackendTarget::Ollama { .. } => Provider::Ollama,
            BackendTarget::Amazon { .. } => Provider::Amazon,
        }
    }
}

/// Blank values count as missing
fn present(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProviderConfig {
    pub fn ollama(base_url: &str, model: &str) -> Self {
        Self {
            base_url: Some(base_url.to_string()),
            model: Some(model.to_string()),
            ..Default::default()
        }
    }

    pub fn amazon(region: &str, endpoint: &str) -> Self {
        Self {
            region: Some(region.to_string()),
            endpoint: Some(endpoint.to_string()),
            ..Default::default()
        }
    }

    /// Resolve the named provider against these fields
    pub fn resolve(&self, provider: &str) -> Result<BackendTarget, ProviderConfigError> {
        match provider.parse::<Provider>()? {
            Provider::Ollama => match (present(&self.base_url), present(&self.model)) {
                (Some(base_url), Some(model)) => Ok(BackendTarget::Ollama { base_url, model }),
                _ => Err(ProviderConfigError::MissingOllama),
            },
            Provider::Amazon => match (present(&self.region), present(&self.endpoint)) {
                (Some(region), Some(endpoint)) => Ok(BackendTarget::Amazon { region, endpoint }),
                _ => Err(ProviderConfigError::MissingAmazon),
            },
        }
    }
}
