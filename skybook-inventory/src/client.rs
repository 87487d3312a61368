use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use skybook_core::error::{BookingError, BookingResult};
use skybook_core::inventory::{Flight, FlightInventory};

/// HTTP client for the remote flight service.
///
/// Wire contract: `GET /api/v1/flights/{id}` returns the flight inside a
/// `{data: ...}` envelope; `PATCH /api/v1/flights/{id}/seats` with body
/// `{"seats": N, "dec": 1}` decrements capacity (reserve) and `"dec": 0`
/// increments it (release).
pub struct HttpFlightInventory {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FlightEnvelope {
    data: FlightPayload,
}

#[derive(Debug, Deserialize)]
struct FlightPayload {
    id: Uuid,
    price: i64,
    #[serde(rename = "totalSeats")]
    total_seats: i32,
}

impl HttpFlightInventory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    fn flight_url(&self, flight_id: Uuid) -> String {
        format!("{}/api/v1/flights/{}", self.base_url, flight_id)
    }

    async fn patch_seats(&self, flight_id: Uuid, count: i32, dec: u8) -> BookingResult<()> {
        let url = format!("{}/seats", self.flight_url(flight_id));
        let response = self
            .http
            .patch(&url)
            .json(&json!({ "seats": count, "dec": dec }))
            .send()
            .await
            .map_err(|e| BookingError::Unavailable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                debug!(%flight_id, count, dec, "flight seats patched");
                Ok(())
            }
            reqwest::StatusCode::NOT_FOUND => {
                Err(BookingError::NotFound(format!("flight {flight_id}")))
            }
            s => Err(BookingError::Unavailable(format!(
                "flight service returned {s} for seat update"
            ))),
        }
    }
}

#[async_trait]
impl FlightInventory for HttpFlightInventory {
    async fn get_flight(&self, flight_id: Uuid) -> BookingResult<Flight> {
        let response = self
            .http
            .get(self.flight_url(flight_id))
            .send()
            .await
            .map_err(|e| BookingError::Unavailable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                let envelope: FlightEnvelope = response
                    .json()
                    .await
                    .map_err(|e| BookingError::Unavailable(e.to_string()))?;
                Ok(Flight {
                    id: envelope.data.id,
                    price: envelope.data.price,
                    total_seats: envelope.data.total_seats,
                })
            }
            reqwest::StatusCode::NOT_FOUND => {
                Err(BookingError::NotFound(format!("flight {flight_id}")))
            }
            s => Err(BookingError::Unavailable(format!(
                "flight service returned {s}"
            ))),
        }
    }

    async fn reserve_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()> {
        self.patch_seats(flight_id, count, 1).await
    }

    async fn release_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()> {
        self.patch_seats(flight_id, count, 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_envelope_uses_camel_case_wire_names() {
        let body = r#"{
            "data": {
                "id": "7f8f2f90-9a4b-4f6b-9e7e-1f0b9a6d2c11",
                "price": 4500,
                "totalSeats": 120
            }
        }"#;
        let envelope: FlightEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.price, 4500);
        assert_eq!(envelope.data.total_seats, 120);
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = HttpFlightInventory::new("http://flights.internal/");
        let id = Uuid::nil();
        assert_eq!(
            client.flight_url(id),
            format!("http://flights.internal/api/v1/flights/{id}")
        );
    }
}
