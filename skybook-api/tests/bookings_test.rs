use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use skybook_api::{app, AppState};
use skybook_booking::LifecycleEngine;
use skybook_core::idempotency::MemoryIdempotencyGuard;
use skybook_core::inventory::{Flight, MockFlightInventory};
use skybook_core::store::MemoryBookingStore;

const SEAT_PRICE: i64 = 2500;

/// Router wired to in-memory collaborators, with one flight seeded.
fn test_app() -> (axum::Router, Uuid) {
    let inventory = Arc::new(MockFlightInventory::new());
    let flight_id = Uuid::new_v4();
    inventory.add_flight(Flight {
        id: flight_id,
        price: SEAT_PRICE,
        total_seats: 50,
    });

    let engine = Arc::new(LifecycleEngine::new(
        Arc::new(MemoryBookingStore::new()),
        inventory,
        Arc::new(MemoryIdempotencyGuard::new()),
        chrono::Duration::minutes(5),
    ));

    (app(AppState { engine }), flight_id)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn info_endpoint_reports_liveness() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_booking_returns_201_with_computed_cost() {
    let (app, flight_id) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/bookings",
        json!({
            "flight_id": flight_id,
            "user_id": Uuid::new_v4(),
            "no_of_seats": 2,
        }),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("INITIATED"));
    assert_eq!(body["data"]["total_cost"], json!(SEAT_PRICE * 2));
}

#[tokio::test]
async fn overbooking_is_rejected_with_400() {
    let (app, flight_id) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/bookings",
        json!({
            "flight_id": flight_id,
            "user_id": Uuid::new_v4(),
            "no_of_seats": 51,
        }),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn payment_requires_idempotency_header() {
    let (app, _) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/bookings/payments",
        json!({
            "booking_id": Uuid::new_v4(),
            "total_cost": 100,
            "user_id": Uuid::new_v4(),
        }),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn payment_flow_confirms_then_rejects_replay() {
    let (app, flight_id) = test_app();
    let user_id = Uuid::new_v4();

    let (_, created) = post_json(
        &app,
        "/api/v1/bookings",
        json!({
            "flight_id": flight_id,
            "user_id": user_id,
            "no_of_seats": 1,
        }),
        &[],
    )
    .await;
    let booking_id = created["data"]["id"].as_str().unwrap().to_string();

    let payment = json!({
        "booking_id": booking_id,
        "total_cost": SEAT_PRICE,
        "user_id": user_id,
    });

    let (status, body) = post_json(
        &app,
        "/api/v1/bookings/payments",
        payment.clone(),
        &[("x-idempotency-key", "replay-1")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CONFIRMED"));

    // Same key again: rejected, booking untouched.
    let (status, body) = post_json(
        &app,
        "/api/v1/bookings/payments",
        payment,
        &[("x-idempotency-key", "replay-1")],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn cancel_is_idempotent_over_http() {
    let (app, flight_id) = test_app();

    let (_, created) = post_json(
        &app,
        "/api/v1/bookings",
        json!({
            "flight_id": flight_id,
            "user_id": Uuid::new_v4(),
            "no_of_seats": 1,
        }),
        &[],
    )
    .await;
    let booking_id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/bookings/{booking_id}/cancel");

    let (status, body) = post_json(&app, &uri, json!({}), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CANCELLED"));

    let (status, body) = post_json(&app, &uri, json!({}), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CANCELLED"));
}
