//! API error responses
//!
//! Every failure leaves the server as `{"error": "<message>"}` with a status
//! picked by `ApiError::status_code`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ExecuteError, PlanError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Plan(PlanError::Backend(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Plan(PlanError::Execution(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Execute(ExecuteError::Unexecutable(_))
            | ApiError::Execute(ExecuteError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Execute(ExecuteError::Execution(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
