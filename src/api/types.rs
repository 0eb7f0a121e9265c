//! Request and response bodies

use serde::{Deserialize, Serialize};

use crate::catalog::QueryDefinition;
use crate::executor::TablePayload;
use crate::plan::Plan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Catalog listing with normalized parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueriesResponse {
    pub queries: Vec<QueryDefinition>,
}

/// Caller-supplied plan (predefined queries skip the backend)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub plan: Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub table: TablePayload,
}
