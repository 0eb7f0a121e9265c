//! REST API
//!
//! axum router over the plan orchestrator.

mod error;
mod routes;
mod state;
mod types;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_planner_router;
pub use state::AppState;
pub use types::{ExecuteRequest, ExecuteResponse, HealthResponse, QueriesResponse};
