//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
    /// Database connection status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Cache status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database: None,
        cache: None,
    })
}

/// Readiness check endpoint (includes database and cache checks).
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service readiness", body = HealthResponse)
    )
)]
pub async fn readiness(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let database = match &state.pool {
        Some(pool) => Some(match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => "connected".to_string(),
            Err(e) => format!("error: {}", e),
        }),
        None => None,
    };
    let cache = match state.cache.get("health").await {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let healthy = cache == "connected" && database.as_deref().map_or(true, |d| d == "connected");
    let status = if healthy { "ready" } else { "degraded" };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database,
        cache: Some(cache),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{app, send};
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        let (router, _state) = app();
        let (status, body) = send(&router, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert!(body.get("database").is_none());
    }
}
