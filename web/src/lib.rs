//! Axum HTTP surface for the order store.
//!
//! Handlers are thin: each parses the request, calls the
//! [`OrderStore`](order_api_core::OrderStore), and maps the result to a
//! status code. No order state is held here.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives; the correlation ID layer tags it and opens a span
//! 2. **Extract data** from path, query and JSON body (rejections become 400)
//! 3. **Call the store** (insert, lookup, update, delete or scan)
//! 4. **Map result** to HTTP response via [`AppError`]
//!
//! | Store error | Status |
//! |-------------|--------|
//! | `NotFound`, `NotExist` | 404 |
//! | `AlreadyExists` | 409 |
//! | `Serialization`, `Transport` | 500 |
//!
//! # Example
//!
//! ```ignore
//! use order_api_core::OrderStore;
//! use order_api_web::{app_router, AppState};
//!
//! let state = AppState::new(OrderStore::new(Arc::new(backend)));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app_router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::{AppError, ErrorResponse};
pub use extractors::CorrelationId;
pub use middleware::{propagate_correlation_id, CORRELATION_ID_HEADER};
pub use router::app_router;
pub use state::AppState;
