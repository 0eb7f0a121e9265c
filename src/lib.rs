//! RAG Planner - catalog-grounded query planning
//!
//! Turns a free-text request into a validated execution plan against a fixed
//! catalog of parameterized queries.
//!
//! ## Pipeline
//!
//! ```text
//! request text
//!     │
//!     ▼
//! RetrievalEngine (semantic index, keyword fallback) ──► top-k QueryDefinitions
//!     │
//!     ▼
//! prompt ──► LlmClient (Ollama / SageMaker) ──► raw text
//!     │
//!     ▼
//! plan::extract ──► Plan
//!     │
//!     ├── NOT_PROVIDED sentinel? ──► clarification response
//!     ├── parameter violation?   ──► validation-error response
//!     ▼
//! PlanExecutor ──► result table
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_planner::plan::{extract, Plan};
//!
//! let plan = extract(r#"JSON:[{"step":1,"name":"sales report","parameters":{}}]"#);
//! assert!(matches!(plan, Plan::Steps(_)));
//! ```

// Core error handling
pub mod error;

// Catalog: query definitions, schema normalization, loading
pub mod catalog;

// Retrieval over the catalog (semantic + keyword)
pub mod retrieval;

// Plan model and extraction from generated text
pub mod plan;

// Parameter validation and NOT_PROVIDED detection
pub mod validation;

// Generation backends
pub mod llm;

pub mod prompt;
pub mod executor;
pub mod orchestrator;
pub mod config;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

// Public re-exports
pub use catalog::{Catalog, CatalogStore, ParamType, ParameterSpec, QueryDefinition};
pub use config::ServiceConfig;
pub use error::{CatalogError, ConfigError, ExecuteError, PlanError, RetrievalError};
pub use executor::{PlaceholderExecutor, PlanExecutor, TablePayload};
pub use llm::{LlmClient, Provider, ProviderConfig};
pub use orchestrator::{PlanOrchestrator, PlanRequest, PlanResponse, PlanStatus};
pub use plan::{Plan, PlanFailure, PlanStep};
pub use retrieval::{RetrievalEngine, RetrievalHit};
pub use validation::{MissingParameter, MissingValueReport, ParameterViolation};
