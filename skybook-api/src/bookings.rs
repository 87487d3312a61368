use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use skybook_core::error::BookingError;

use crate::error::AppError;
use crate::state::AppState;

const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/bookings", post(create_booking))
        .route("/api/v1/bookings/{id}", get(get_booking))
        .route("/api/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/api/v1/bookings/payments", post(make_payment))
}

fn envelope(message: &str, data: impl Serialize) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
        "error": {},
    }))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    flight_id: Uuid,
    user_id: Uuid,
    no_of_seats: i32,
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .engine
        .create_booking(req.flight_id, req.user_id, req.no_of_seats)
        .await?;

    Ok((
        StatusCode::CREATED,
        envelope("Booking created successfully", booking),
    ))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.engine.booking(id).await?;
    Ok(envelope("Booking fetched successfully", booking))
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    booking_id: Uuid,
    total_cost: i64,
    user_id: Uuid,
}

async fn make_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    // The key is required before the engine is ever invoked.
    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            BookingError::Validation(format!("{IDEMPOTENCY_HEADER} header is required"))
        })?;

    let booking = state
        .engine
        .make_payment(req.booking_id, req.user_id, req.total_cost, idempotency_key)
        .await?;

    Ok(envelope("Payment successful", booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.engine.cancel_booking(id).await?;
    Ok(envelope("Booking cancelled successfully", booking))
}
