//! Order endpoints.
//!
//! Thin adapters over [`OrderStore`](order_api_core::OrderStore): parse the
//! request, call one or two store operations, map the outcome to a status
//! code. Extractor rejections are turned into 400 responses with the common
//! JSON error body.

use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use order_api_core::{CustomerId, FindResult, LineItem, Order, OrderId, OrderStatus, Page};
use serde::{Deserialize, Serialize};

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Caller-chosen ID; a random one is assigned when absent.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    /// Ordering customer.
    pub customer_id: CustomerId,
    /// Items ordered.
    pub line_items: Vec<LineItem>,
}

/// Body of `PUT /orders/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    /// Target lifecycle state, `shipped` or `completed`.
    pub status: OrderStatus,
}

/// Query string of `GET /orders`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListOrdersQuery {
    /// Cursor from the previous page, `0` or absent to start.
    #[serde(default, alias = "offset")]
    pub cursor: Option<u64>,
    /// Page size.
    #[serde(default, alias = "page_size")]
    pub size: Option<usize>,
}

/// `POST /orders`
///
/// # Errors
///
/// - 400 if the body is malformed
/// - 409 if an order with the ID already exists
/// - 500 on store failure
pub async fn create_order(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(request) = body?;

    let order_id = request
        .order_id
        .unwrap_or_else(|| OrderId::new(rand::random()));
    let order = Order::place(
        order_id,
        request.customer_id,
        request.line_items,
        state.clock.now(),
    );

    state.store.insert(&order).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        order_id = %order.order_id,
        total = order.total(),
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders?cursor=N&size=M`
///
/// # Errors
///
/// - 400 if the query is malformed or `size` is 0 or above the maximum
/// - 500 on store failure
pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<FindResult>, AppError> {
    let Query(query) = query?;

    let size = query.size.unwrap_or(state.page_size_default);
    if size == 0 || size > state.page_size_max {
        return Err(AppError::bad_request(format!(
            "size must be between 1 and {}",
            state.page_size_max
        )));
    }

    let page = Page::resume(size, query.cursor.unwrap_or(0));
    let result = state.store.find_all(page).await?;
    Ok(Json(result))
}

/// `GET /orders/{id}`
///
/// # Errors
///
/// - 400 if the ID is not a number
/// - 404 if the order does not exist
/// - 500 on store failure
pub async fn get_order(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    let order = state.store.find_by_id(OrderId::new(id)).await?;
    Ok(Json(order))
}

/// `PUT /orders/{id}`
///
/// Loads the order, applies the requested lifecycle transition stamped with
/// the current time, and writes it back. A concurrent delete between the read
/// and the write surfaces as 404.
///
/// # Errors
///
/// - 400 if the ID or body is malformed, or the transition is not allowed
/// - 404 if the order does not exist
/// - 500 on store failure
pub async fn update_order(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id?;
    let Json(request) = body?;

    let mut order = state.store.find_by_id(OrderId::new(id)).await?;
    let now = state.clock.now();
    match request.status {
        OrderStatus::Shipped => order.ship(now)?,
        OrderStatus::Completed => order.complete(now)?,
        OrderStatus::Placed => {
            return Err(AppError::bad_request(
                "status must be \"shipped\" or \"completed\"",
            ));
        }
    }

    state.store.update(&order).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        order_id = %order.order_id,
        status = %order.status(),
        "Order status changed"
    );
    Ok(Json(order))
}

/// `DELETE /orders/{id}`
///
/// # Errors
///
/// - 400 if the ID is not a number
/// - 404 if the order does not exist
/// - 500 on store failure
pub async fn delete_order(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.store.delete_by_id(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
