//! Service configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `RAG_HOST` | `0.0.0.0` |
//! | `RAG_PORT` | `8000` |
//! | `RAG_YAML` | `rag.yaml` |
//! | `RAG_INDEX_DIR` | `.rag_index` |
//! | `RAG_TOP_K` | `5` |
//! | `RAG_LLM_TIMEOUT_SECS` | `60` |
//! | `RAG_STRICT_QUERY_NAMES` | `false` |
//! | `RAG_SEMANTIC` | `true` |
//! | `RAG_CORS_ORIGINS` | empty (any origin) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::orchestrator::OrchestratorOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub catalog_path: PathBuf,
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub llm_timeout: Duration,
    pub strict_query_names: bool,
    pub semantic: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            catalog_path: PathBuf::from("rag.yaml"),
            index_dir: PathBuf::from(".rag_index"),
            top_k: 5,
            llm_timeout: Duration::from_secs(60),
            strict_query_names: false,
            semantic: true,
            cors_origins: Vec::new(),
        }
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl ServiceConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; unset or blank variables keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("RAG_HOST") {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get("RAG_PORT") {
            config.port = parse_number("RAG_PORT", &port)?;
        }
        if let Some(path) = get("RAG_YAML") {
            config.catalog_path = PathBuf::from(path);
        }
        if let Some(dir) = get("RAG_INDEX_DIR") {
            config.index_dir = PathBuf::from(dir);
        }
        if let Some(top_k) = get("RAG_TOP_K") {
            config.top_k = parse_number("RAG_TOP_K", &top_k)?;
        }
        if let Some(secs) = get("RAG_LLM_TIMEOUT_SECS") {
            config.llm_timeout = Duration::from_secs(parse_number("RAG_LLM_TIMEOUT_SECS", &secs)?);
        }
        if let Some(strict) = get("RAG_STRICT_QUERY_NAMES") {
            config.strict_query_names = parse_flag("RAG_STRICT_QUERY_NAMES", &strict)?;
        }
        if let Some(semantic) = get("RAG_SEMANTIC") {
            config.semantic = parse_flag("RAG_SEMANTIC", &semantic)?;
        }
        if let Some(origins) = get("RAG_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            top_k: self.top_k,
            strict_query_names: self.strict_query_names,
        }
    }
}
