use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};

/// The slice of a flight the booking service needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    /// Price per seat.
    pub price: i64,
    /// Seats currently available for sale.
    pub total_seats: i32,
}

/// Client for the remote flight-inventory service. Every call is a
/// synchronous round-trip with no built-in retry; the retry policy belongs
/// to the caller. Reservations and releases are NOT atomic with any local
/// state the caller keeps.
#[async_trait]
pub trait FlightInventory: Send + Sync {
    async fn get_flight(&self, flight_id: Uuid) -> BookingResult<Flight>;

    /// Decrement remote capacity by `count`.
    async fn reserve_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()>;

    /// Increment remote capacity by `count`.
    async fn release_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()>;
}

/// In-memory stand-in for the flight service, used by tests and local runs.
/// `set_failing(true)` makes every call return `Unavailable`, which is how
/// the partial-failure paths are exercised.
#[derive(Default)]
pub struct MockFlightInventory {
    flights: Mutex<HashMap<Uuid, Flight>>,
    failing: AtomicBool,
}

impl MockFlightInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_flight(&self, flight: Flight) {
        self.lock().insert(flight.id, flight);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current remote seat count, for assertions.
    pub fn seats_for(&self, flight_id: Uuid) -> Option<i32> {
        self.lock().get(&flight_id).map(|f| f.total_seats)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Flight>> {
        self.flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_remote(&self) -> BookingResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BookingError::Unavailable(
                "simulated flight service outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FlightInventory for MockFlightInventory {
    async fn get_flight(&self, flight_id: Uuid) -> BookingResult<Flight> {
        self.check_remote()?;
        self.lock()
            .get(&flight_id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("flight {flight_id}")))
    }

    async fn reserve_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()> {
        self.check_remote()?;
        let mut flights = self.lock();
        let flight = flights
            .get_mut(&flight_id)
            .ok_or_else(|| BookingError::NotFound(format!("flight {flight_id}")))?;
        flight.total_seats -= count;
        Ok(())
    }

    async fn release_seats(&self, flight_id: Uuid, count: i32) -> BookingResult<()> {
        self.check_remote()?;
        let mut flights = self.lock();
        let flight = flights
            .get_mut(&flight_id)
            .ok_or_else(|| BookingError::NotFound(format!("flight {flight_id}")))?;
        flight.total_seats += count;
        Ok(())
    }
}
