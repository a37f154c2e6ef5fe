//! Custom Axum extractors.

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Handlers get the ID chosen by
/// [`propagate_correlation_id`](crate::middleware::propagate_correlation_id),
/// so their logs match the response header. Without the middleware the ID
/// is read from the request header, or generated.
///
/// ```ignore
/// async fn handler(correlation_id: CorrelationId) -> Result<Json<Order>, AppError> {
///     tracing::info!(%correlation_id, "Processing request");
///     Ok(Json(order))
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// ID from the `x-correlation-id` header if it holds a UUID, otherwise a new v4.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self(id)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}
