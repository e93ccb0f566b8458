//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each admin endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use ticker_cache::{api::create_router, AppState, DurableStore, ManualClock};
use tower::ServiceExt;

const T0: i64 = 1_700_000_000_000;
const RETENTION: Duration = Duration::from_secs(168 * 3600);

// == Helper Functions ==

fn create_test_app() -> (Router, Arc<DurableStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(DurableStore::in_memory_with_clock(clock.clone()).unwrap());
    let state = AppState::new(store.clone(), RETENTION);
    (create_router(state), store, clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

// == Entry Endpoint Tests ==

#[tokio::test]
async fn test_get_entry_success() {
    let (app, store, clock) = create_test_app();
    store
        .set("stock_AAPL_1mo", br#"{"bars":[]}"#)
        .unwrap();
    clock.advance(Duration::from_secs(1800));

    let response = app.oneshot(get("/entries/stock_AAPL_1mo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "stock_AAPL_1mo");
    assert_eq!(json["age_seconds"], 1800);
    assert_eq!(json["size_bytes"], 11);
    assert_eq!(json["decodable"], true);
    assert!(json["stored_at"].as_str().unwrap().starts_with("2023-11-14T"));
}

#[tokio::test]
async fn test_get_entry_reports_undecodable_payload() {
    let (app, store, _clock) = create_test_app();
    store.set("commentary_abc", &[0xde, 0xad, 0xbe, 0xef]).unwrap();

    let response = app.oneshot(get("/entries/commentary_abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["decodable"], false);
}

#[tokio::test]
async fn test_get_entry_not_found() {
    let (app, _store, _clock) = create_test_app();

    let response = app.oneshot(get("/entries/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_delete_entry_success() {
    let (app, store, _clock) = create_test_app();
    store.set("to_delete", b"\"value\"").unwrap();

    let response = app
        .clone()
        .oneshot(delete("/entries/to_delete"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "to_delete");
    assert_eq!(json["removed"], true);

    let response = app.oneshot(get("/entries/to_delete")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_entry_absent_is_ok() {
    let (app, _store, _clock) = create_test_app();

    let response = app.oneshot(delete("/entries/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], false);
}

// == Sweep Endpoint Tests ==

#[tokio::test]
async fn test_sweep_with_default_retention() {
    let (app, store, clock) = create_test_app();
    store.set("old", b"1").unwrap();
    clock.advance(RETENTION + Duration::from_secs(1));
    store.set("fresh", b"2").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sweep")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);
    assert_eq!(json["max_age_hours"], 168);
    assert!(store.get("fresh").unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_with_explicit_horizon() {
    let (app, store, clock) = create_test_app();
    store.set("a", b"1").unwrap();
    store.set("b", b"2").unwrap();
    clock.advance(Duration::from_secs(3 * 3600));

    let response = app
        .oneshot(post_json("/sweep", r#"{"max_age_hours": 2}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_sweep_rejects_out_of_range_horizon() {
    let (app, _store, _clock) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/sweep",
            r#"{"max_age_hours": 18446744073709551615}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sweep_invalid_json() {
    let (app, _store, _clock) = create_test_app();

    let response = app
        .oneshot(post_json("/sweep", r#"{"max_age_hours": "soon"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, store, clock) = create_test_app();

    let response = app.clone().oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["entries"], 0);
    assert!(json["oldest_stored_at"].is_null());

    store.set("first", b"123").unwrap();
    clock.advance(Duration::from_secs(60));
    store.set("second", b"4567").unwrap();

    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["entries"], 2);
    assert_eq!(json["payload_bytes"], 7);
    assert_ne!(json["oldest_stored_at"], json["newest_stored_at"]);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _store, _clock) = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _store, _clock) = create_test_app();

    let response = app.oneshot(get("/get/anything")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
