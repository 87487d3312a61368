use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::error::{BookingError, BookingResult};

/// Persistence contract for booking records. The store does not enforce the
/// lifecycle state machine (that is the engine's job) but every method must
/// be atomic on its own so that concurrent operations on the same id
/// serialize instead of losing updates.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new booking with status forced to INITIATED.
    async fn create(&self, new_booking: NewBooking) -> BookingResult<Booking>;

    async fn get(&self, id: Uuid) -> BookingResult<Booking>;

    /// Unconditional atomic status write.
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking>;

    /// Status-conditioned transition: applies only while the row is still
    /// INITIATED. Returns `None` when another transition committed first,
    /// which is how racing payment/cancel/expiry attempts resolve to a
    /// single winner.
    async fn transition_from_initiated(
        &self,
        id: Uuid,
        to: BookingStatus,
    ) -> BookingResult<Option<Booking>>;

    /// One set-based update: every INITIATED booking created before
    /// `cutoff` becomes CANCELLED. Returns the rows that were expired so
    /// the caller can release their inventory holds.
    async fn expire_stale_initiated(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Booking>>;
}

/// HashMap-backed store used by the engine tests and local runs. Mirrors
/// the conditional-update semantics of the Postgres implementation.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a booking as-is, back-dated timestamps included.
    pub fn seed(&self, booking: Booking) {
        self.lock().insert(booking.id, booking);
    }

    /// Snapshot of every record, for assertions.
    pub fn all(&self) -> Vec<Booking> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Booking>> {
        self.bookings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn create(&self, new_booking: NewBooking) -> BookingResult<Booking> {
        if new_booking.no_of_seats < 1 {
            return Err(BookingError::Validation(
                "noOfSeats must be at least 1".to_string(),
            ));
        }
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            flight_id: new_booking.flight_id,
            user_id: new_booking.user_id,
            no_of_seats: new_booking.no_of_seats,
            total_cost: new_booking.total_cost,
            status: BookingStatus::Initiated,
            created_at: now,
            updated_at: now,
        };
        self.lock().insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> BookingResult<Booking> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        let mut bookings = self.lock();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn transition_from_initiated(
        &self,
        id: Uuid,
        to: BookingStatus,
    ) -> BookingResult<Option<Booking>> {
        let mut bookings = self.lock();
        match bookings.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Initiated => {
                booking.status = to;
                booking.updated_at = Utc::now();
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn expire_stale_initiated(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Booking>> {
        let mut bookings = self.lock();
        let now = Utc::now();
        let mut expired = Vec::new();
        for booking in bookings.values_mut() {
            if booking.status == BookingStatus::Initiated && booking.created_at < cutoff {
                booking.status = BookingStatus::Cancelled;
                booking.updated_at = now;
                expired.push(booking.clone());
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_booking() -> NewBooking {
        NewBooking {
            flight_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            no_of_seats: 2,
            total_cost: 500,
        }
    }

    #[tokio::test]
    async fn create_forces_initiated() {
        let store = MemoryBookingStore::new();
        let booking = store.create(new_booking()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Initiated);
        assert_eq!(store.get(booking.id).await.unwrap().total_cost, 500);
    }

    #[tokio::test]
    async fn create_rejects_non_positive_seats() {
        let store = MemoryBookingStore::new();
        let mut req = new_booking();
        req.no_of_seats = 0;
        assert!(matches!(
            store.create(req).await,
            Err(BookingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn conditioned_transition_only_fires_once() {
        let store = MemoryBookingStore::new();
        let booking = store.create(new_booking()).await.unwrap();

        let first = store
            .transition_from_initiated(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert!(first.is_some());

        // A racing transition must observe the terminal state and lose.
        let second = store
            .transition_from_initiated(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(
            store.get(booking.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn bulk_expiry_only_touches_stale_initiated_rows() {
        let store = MemoryBookingStore::new();
        let stale = store.create(new_booking()).await.unwrap();
        let fresh = store.create(new_booking()).await.unwrap();
        let confirmed = store.create(new_booking()).await.unwrap();

        // Back-date the stale and confirmed rows past the cutoff.
        let old = Utc::now() - chrono::Duration::minutes(10);
        for id in [stale.id, confirmed.id] {
            let mut b = store.get(id).await.unwrap();
            b.created_at = old;
            store.seed(b);
        }
        store
            .update_status(confirmed.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(5);
        let expired = store.expire_stale_initiated(cutoff).await.unwrap();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, stale.id);
        assert_eq!(
            store.get(fresh.id).await.unwrap().status,
            BookingStatus::Initiated
        );
        assert_eq!(
            store.get(confirmed.id).await.unwrap().status,
            BookingStatus::Confirmed
        );
    }
}
