//! Route table.

use crate::handlers::{
    create_order, delete_order, get_order, health_check, list_orders, metrics, readiness_check,
    update_order,
};
use crate::middleware::propagate_correlation_id;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// | Route | Handler |
/// |-------|---------|
/// | `GET /` | liveness |
/// | `GET /health/ready` | store ping |
/// | `GET /metrics` | Prometheus text |
/// | `POST /orders`, `GET /orders` | create, list |
/// | `GET/PUT/DELETE /orders/:id` | lookup, status change, delete |
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .layer(middleware::from_fn(propagate_correlation_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
