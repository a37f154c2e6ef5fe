//! HTTP API tests against the in-memory backend.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::http::StatusCode;
use axum_test::TestServer;
use order_api_core::{FindResult, Order, OrderId, OrderStatus, OrderStore};
use order_api_testing::{fixtures, mocks::test_clock, FaultPoint, InMemoryBackend};
use order_api_web::{app_router, AppState, ErrorResponse, CORRELATION_ID_HEADER};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn server_with(backend: &InMemoryBackend) -> TestServer {
    let state = AppState::new(OrderStore::new(Arc::new(backend.clone())))
        .with_clock(Arc::new(test_clock()))
        .with_page_sizes(2, 10);
    TestServer::new(app_router(state)).unwrap()
}

fn create_body(order_id: u64) -> serde_json::Value {
    json!({
        "order_id": order_id,
        "customer_id": "6f1c1b9e-52a4-4a8e-9d53-0a4b7f6a2c11",
        "line_items": [
            { "item_id": "0b0fb7cc-51f1-4c8b-a3a5-5d1c2e0e8a01", "quantity": 2, "price": 1500 }
        ]
    })
}

#[tokio::test]
async fn test_liveness_does_not_touch_store() {
    let backend = InMemoryBackend::new();
    backend.fail_next(FaultPoint::Ping).unwrap();
    let server = server_with(&backend);

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_readiness_reflects_store_ping() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);

    server.get("/health/ready").await.assert_status_ok();

    backend.fail_next(FaultPoint::Ping).unwrap();
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_absent_without_recorder() {
    let server = server_with(&InMemoryBackend::new());
    let response = server.get("/metrics").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "METRICS_DISABLED");
    assert_eq!(error.message, "metrics recorder not installed");
}

#[tokio::test]
async fn test_create_then_get() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);

    let response = server.post("/orders").json(&create_body(42)).await;
    response.assert_status(StatusCode::CREATED);
    let created: Order = response.json();
    assert_eq!(created.order_id, OrderId::new(42));
    assert_eq!(created.created_on, Some(fixtures::placed_at()));
    assert_eq!(created.status(), OrderStatus::Placed);

    let fetched: Order = server.get("/orders/42").await.json();
    assert_eq!(fetched, created);
    assert!(backend.is_consistent("orders", "order:").unwrap());
}

#[tokio::test]
async fn test_create_assigns_id_when_absent() {
    let server = server_with(&InMemoryBackend::new());

    let mut body = create_body(0);
    body.as_object_mut().unwrap().remove("order_id");

    let response = server.post("/orders").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let created: Order = response.json();

    server
        .get(&format!("/orders/{}", created.order_id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_create_duplicate_is_conflict() {
    let server = server_with(&InMemoryBackend::new());

    server
        .post("/orders")
        .json(&create_body(7))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.post("/orders").json(&create_body(7)).await;
    response.assert_status(StatusCode::CONFLICT);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "CONFLICT");
}

#[tokio::test]
async fn test_create_malformed_body_is_bad_request() {
    let server = server_with(&InMemoryBackend::new());

    let response = server
        .post("/orders")
        .json(&json!({ "customer_id": "not-a-uuid", "line_items": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "BAD_REQUEST");

    server
        .post("/orders")
        .text("not json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_store_failure_is_internal_error() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);
    backend.fail_next(FaultPoint::InsertAfterWrite).unwrap();

    let response = server.post("/orders").json(&create_body(9)).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "INTERNAL_SERVER_ERROR");
    assert!(backend.record_keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_is_not_found() {
    let server = server_with(&InMemoryBackend::new());
    let response = server.get("/orders/404").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "NOT_FOUND");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let server = server_with(&InMemoryBackend::new());
    server
        .get("/orders/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .delete("/orders/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_corrupt_record_is_internal_error() {
    let backend = InMemoryBackend::new();
    backend.raw_put("order:5", "{broken").unwrap();
    let server = server_with(&backend);

    server
        .get("/orders/5")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_update_walks_lifecycle() {
    let server = server_with(&InMemoryBackend::new());
    server.post("/orders").json(&create_body(1)).await;

    let shipped: Order = server
        .put("/orders/1")
        .json(&json!({ "status": "shipped" }))
        .await
        .json();
    assert_eq!(shipped.status(), OrderStatus::Shipped);

    let completed: Order = server
        .put("/orders/1")
        .json(&json!({ "status": "completed" }))
        .await
        .json();
    assert_eq!(completed.status(), OrderStatus::Completed);

    let fetched: Order = server.get("/orders/1").await.json();
    assert_eq!(fetched, completed);
}

#[tokio::test]
async fn test_update_invalid_transition_is_bad_request() {
    let server = server_with(&InMemoryBackend::new());
    server.post("/orders").json(&create_body(1)).await;

    let response = server
        .put("/orders/1")
        .json(&json!({ "status": "completed" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "INVALID_TRANSITION");

    server
        .put("/orders/1")
        .json(&json!({ "status": "placed" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .put("/orders/1")
        .json(&json!({ "state": "shipped" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_unknown_is_not_found() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);

    server
        .put("/orders/77")
        .json(&json!({ "status": "shipped" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(backend.record_keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_get() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);
    server.post("/orders").json(&create_body(3)).await;

    server
        .delete("/orders/3")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/orders/3")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/orders/3")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(backend.index_members("orders").unwrap().is_empty());
}

#[tokio::test]
async fn test_list_pages_through_all_orders() {
    let server = server_with(&InMemoryBackend::new());
    for id in 1..=5 {
        server
            .post("/orders")
            .json(&create_body(id))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let mut seen = HashSet::new();
    let mut cursor = 0;
    loop {
        let page: FindResult = server
            .get("/orders")
            .add_query_param("cursor", cursor)
            .add_query_param("size", 2)
            .await
            .json();
        assert!(page.orders.len() <= 2);
        for order in &page.orders {
            assert!(seen.insert(order.order_id.value()), "order listed twice");
        }
        if page.is_last() {
            break;
        }
        cursor = page.cursor;
    }
    assert_eq!(seen, (1..=5).collect());
}

#[tokio::test]
async fn test_list_uses_default_size_and_aliases() {
    let server = server_with(&InMemoryBackend::new());
    for id in 1..=3 {
        server.post("/orders").json(&create_body(id)).await;
    }

    // Default page size is 2 in these tests
    let first: FindResult = server.get("/orders").await.json();
    assert_eq!(first.orders.len(), 2);
    assert!(!first.is_last());

    let rest: FindResult = server
        .get("/orders")
        .add_query_param("offset", first.cursor)
        .add_query_param("page_size", 5)
        .await
        .json();
    assert_eq!(rest.orders.len(), 1);
    assert!(rest.is_last());
}

#[tokio::test]
async fn test_list_empty_store() {
    let server = server_with(&InMemoryBackend::new());
    let response = server.get("/orders").await;
    response.assert_status_ok();
    let page: FindResult = response.json();
    assert!(page.orders.is_empty());
    assert_eq!(page.cursor, 0);
}

#[tokio::test]
async fn test_list_rejects_bad_sizes() {
    let server = server_with(&InMemoryBackend::new());
    for size in ["0", "11", "many"] {
        server
            .get("/orders")
            .add_query_param("size", size)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
    server
        .get("/orders")
        .add_query_param("cursor", "-1")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_scan_failure_is_internal_error() {
    let backend = InMemoryBackend::new();
    let server = server_with(&backend);
    backend.fail_next(FaultPoint::Scan).unwrap();

    server
        .get("/orders")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_correlation_id_echoed() {
    let server = server_with(&InMemoryBackend::new());
    let id = "0b0fb7cc-51f1-4c8b-a3a5-5d1c2e0e8a01";

    let response = server
        .get("/orders/1")
        .add_header(
            axum::http::HeaderName::from_static("x-correlation-id"),
            axum::http::HeaderValue::from_static(id),
        )
        .await;
    assert_eq!(response.header(CORRELATION_ID_HEADER), id);
}
