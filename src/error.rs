use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::flows::FlowError;

/// Custom error type for the application
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    ValidationError(String),
    UpstreamError(String),
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::UpstreamError(msg) => {
                error!("Model invocation failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::InvalidRequest(msg) => AppError::ValidationError(msg),
            FlowError::ModelInvocation(e) => AppError::UpstreamError(e.to_string()),
        }
    }
}

/// Result type for application handlers
pub type AppResult<T> = Result<T, AppError>;
