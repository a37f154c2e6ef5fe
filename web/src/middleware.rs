//! Request correlation.
//!
//! [`propagate_correlation_id`] tags every request with a [`CorrelationId`],
//! stores it in the request extensions for handlers, runs the rest of the
//! stack inside a span carrying it, and echoes it in the response header.
//! A valid UUID sent by the client is reused; anything else is replaced.
//!
//! ```ignore
//! use axum::{middleware, Router};
//! use order_api_web::middleware::propagate_correlation_id;
//!
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .layer(middleware::from_fn(propagate_correlation_id));
//! ```

use crate::extractors::CorrelationId;
use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderValue;
use tracing::Instrument;

/// Header carrying the correlation ID, in both directions.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Middleware function for `axum::middleware::from_fn`.
pub async fn propagate_correlation_id(mut req: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(req.headers());
    req.extensions_mut().insert(correlation_id);

    let span = tracing::info_span!(
        "order_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    /// Router whose handler answers with the ID it extracted.
    fn echo_app() -> Router {
        Router::new()
            .route(
                "/orders",
                get(|id: CorrelationId| async move { id.to_string() }),
            )
            .layer(middleware::from_fn(propagate_correlation_id))
    }

    /// Send one request, returning (response header, handler-seen ID).
    async fn round_trip(header: Option<&str>) -> (String, String) {
        let mut request = Request::builder().uri("/orders");
        if let Some(value) = header {
            request = request.header(CORRELATION_ID_HEADER, value);
        }
        let response = echo_app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let echoed = response.headers()[CORRELATION_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_id_is_reused() {
        let sent = Uuid::new_v4().to_string();
        let (echoed, seen) = round_trip(Some(&sent)).await;
        assert_eq!(echoed, sent);
        assert_eq!(seen, sent);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_id_is_replaced_consistently() {
        for header in [None, Some("not-a-uuid")] {
            let (echoed, seen) = round_trip(header).await;
            assert!(Uuid::parse_str(&echoed).is_ok());
            // Handler and response agree on the generated ID
            assert_eq!(echoed, seen);
        }
    }
}
