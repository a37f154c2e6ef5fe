//! Health check and metrics endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Body of a successful readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    /// Always `true` in a 200 response.
    pub ready: bool,
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT touch the order store.
///
/// # Endpoint
///
/// ```text
/// GET /
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: the order store answers a ping.
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Errors
///
/// 503 Service Unavailable if the backend cannot be reached.
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<Readiness>, AppError> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::unavailable("Order store unreachable")
    })?;
    Ok(Json(Readiness { ready: true }))
}

/// Prometheus metrics in text exposition format.
///
/// # Endpoint
///
/// ```text
/// GET /metrics
/// ```
///
/// # Errors
///
/// 404 if no metrics recorder was installed.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or_else(|| {
            AppError::new(
                StatusCode::NOT_FOUND,
                "metrics recorder not installed".to_string(),
                "METRICS_DISABLED".to_string(),
            )
        })
}
