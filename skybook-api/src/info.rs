use axum::{routing::get, Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/info", get(info))
}

async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Booking service is up",
        "data": {},
        "error": {},
    }))
}
