//! Error types for the planner
//!
//! Typed errors are derived with `thiserror`. Backend clients and the server
//! binary use `anyhow` at their edges; everything that crosses a module
//! boundary inside the crate is one of the enums below.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or parsing the catalog source
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Failures on the semantic retrieval path.
///
/// These never reach a caller of `RetrievalEngine::retrieve`; they are logged
/// and the keyword strategy answers instead.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Embedding task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Index dimension mismatch: index has {index}, query has {query}")]
    DimensionMismatch { index: usize, query: usize },
}

/// Invalid environment configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures of a plan request that must surface to the caller.
///
/// Everything else (extraction failures, missing values, validation
/// failures, retrieval degradation) is a typed outcome in `PlanResponse`.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Generation backend call failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("Plan execution failed: {0:#}")]
    Execution(anyhow::Error),
}

/// Why a submitted plan was not executed
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("Plan cannot be executed: {0}")]
    Unexecutable(String),

    #[error("Validation error for '{query}': {message}")]
    Validation { query: String, message: String },

    #[error("Plan execution failed: {0:#}")]
    Execution(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_context_chain() {
        let err = PlanError::Backend(anyhow::anyhow!("connection refused").context("POST /api/chat"));
        let message = err.to_string();
        assert!(message.contains("POST /api/chat"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_execute_validation_message() {
        let err = ExecuteError::Validation {
            query: "sales report".to_string(),
            message: "Missing or empty required parameter 'region'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error for 'sales report': Missing or empty required parameter 'region'"
        );
    }

    #[test]
    fn test_config_error_names_key() {
        let err = ConfigError::InvalidValue {
            key: "RAG_PORT",
            value: "abc".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert!(err.to_string().contains("RAG_PORT"));
        assert!(err.to_string().contains("abc"));
    }
}
