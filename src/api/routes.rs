//! Planner API endpoints
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness
//! - `GET /queries` - catalog with normalized parameters
//! - `POST /execute` - validate and run a caller-supplied plan
//! - `POST /plan` - draft, check and run a plan for free text

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

use super::error::ApiError;
use super::state::AppState;
use super::types::{ExecuteRequest, ExecuteResponse, HealthResponse, QueriesResponse};
use crate::orchestrator::{PlanRequest, PlanResponse};

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn list_queries(State(state): State<AppState>) -> Json<QueriesResponse> {
    let catalog = state.catalog().snapshot().await;
    Json(QueriesResponse {
        queries: catalog.queries().to_vec(),
    })
}

async fn execute_plan(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let table = state.orchestrator.execute(&request.plan).await?;
    Ok(Json(ExecuteResponse { table }))
}

async fn plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let response = state.orchestrator.plan(&request).await?;
    Ok(Json(response))
}

// ============================================================================
// Router
// ============================================================================

/// Create the planner router
pub fn create_planner_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/queries", get(list_queries))
        .route("/execute", post(execute_plan))
        .route("/plan", post(plan))
        .with_state(state)
}
