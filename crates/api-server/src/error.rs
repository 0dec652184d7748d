//! API error types and handling.
//!
//! Every failure is answered with HTTP 400 and a flat `{"err": "..."}` body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use order_engine::OrderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub err: String,
}

impl ErrorResponse {
    pub fn new(err: impl Into<String>) -> Self {
        Self { err: err.into() }
    }
}

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Invalid JSON: {0}")]
    JsonRejection(String),

    #[error("Invalid query: {0}")]
    QueryRejection(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Message sent to the client. Relay-side failures carry only their
    /// category, never the underlying error text.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Order(e) => match e.relay_failure() {
                Some(category) => format!("Request failed: {category}"),
                None => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "JSON parsing failed");
        ApiError::JsonRejection(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::QueryRejection(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Order(e) = &self {
            if !e.is_client_error() {
                tracing::error!(error = %e, "Relay error while serving request");
            }
        }

        let body = ErrorResponse::new(self.client_message());
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
