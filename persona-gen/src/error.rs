//! Error types for persona-gen

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use persona_common::api::ErrorBody;
use thiserror::Error;

use crate::models::ImageError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        (status, Json(ErrorBody::new(error_code, message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
