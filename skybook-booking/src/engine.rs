use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use skybook_core::booking::{Booking, BookingStatus, NewBooking};
use skybook_core::error::{BookingError, BookingResult};
use skybook_core::idempotency::IdempotencyGuard;
use skybook_core::inventory::FlightInventory;
use skybook_core::store::BookingStore;

/// Orchestrates the booking lifecycle across the local store and the
/// remote flight inventory.
///
/// State machine per booking:
/// INITIATED --payment--> CONFIRMED; INITIATED --timeout/cancel-->
/// CANCELLED; both end states are terminal. The two resources cannot be
/// updated atomically, so every transition commits locally through a
/// status-conditioned update first and talks to the remote inventory
/// second; a remote failure after the local commit is reported, never
/// rolled back.
pub struct LifecycleEngine {
    store: Arc<dyn BookingStore>,
    inventory: Arc<dyn FlightInventory>,
    guard: Arc<dyn IdempotencyGuard>,
    expiry_window: Duration,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        inventory: Arc<dyn FlightInventory>,
        guard: Arc<dyn IdempotencyGuard>,
        expiry_window: Duration,
    ) -> Self {
        Self {
            store,
            inventory,
            guard,
            expiry_window,
        }
    }

    /// Create an INITIATED booking and take an eager hold on the seats.
    /// The hold lasts for the expiry window whether or not payment
    /// follows.
    pub async fn create_booking(
        &self,
        flight_id: Uuid,
        user_id: Uuid,
        no_of_seats: i32,
    ) -> BookingResult<Booking> {
        if no_of_seats < 1 {
            return Err(BookingError::Validation(
                "noOfSeats must be at least 1".to_string(),
            ));
        }

        let flight = self.inventory.get_flight(flight_id).await?;
        if flight.total_seats < no_of_seats {
            return Err(BookingError::InsufficientSeats {
                requested: no_of_seats,
                available: flight.total_seats,
            });
        }

        let total_cost = flight.price * i64::from(no_of_seats);
        let booking = self
            .store
            .create(NewBooking {
                flight_id,
                user_id,
                no_of_seats,
                total_cost,
            })
            .await?;

        if let Err(err) = self.inventory.reserve_seats(flight_id, no_of_seats).await {
            // The local record must not keep a hold that was never taken
            // remotely. Bookings are audit-retained, so the rollback is a
            // compensating cancellation rather than a delete.
            if let Err(undo_err) = self
                .store
                .update_status(booking.id, BookingStatus::Cancelled)
                .await
            {
                error!(
                    booking_id = %booking.id,
                    error = %undo_err,
                    "rollback of unreserved booking failed; record is stuck INITIATED"
                );
            }
            return Err(err);
        }

        info!(
            booking_id = %booking.id,
            %flight_id,
            no_of_seats,
            total_cost,
            "booking initiated, seats held"
        );
        Ok(booking)
    }

    /// Fetch a booking by id.
    pub async fn booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.store.get(id).await
    }

    /// Confirm a booking by payment. Guarded by the idempotency key before
    /// any state is touched; a failed attempt gives the key back so the
    /// caller may retry with it.
    pub async fn make_payment(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        amount: i64,
        idempotency_key: &str,
    ) -> BookingResult<Booking> {
        if !self.guard.check_and_reserve(idempotency_key).await? {
            return Err(BookingError::DuplicateRequest(
                "a payment with this idempotency key was already processed".to_string(),
            ));
        }

        match self.attempt_payment(booking_id, user_id, amount).await {
            Ok(booking) => Ok(booking),
            Err(err) => {
                if let Err(forget_err) = self.guard.forget(idempotency_key).await {
                    error!(
                        %booking_id,
                        error = %forget_err,
                        "failed to free idempotency key after failed payment"
                    );
                }
                Err(err)
            }
        }
    }

    async fn attempt_payment(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        amount: i64,
    ) -> BookingResult<Booking> {
        let booking = self.store.get(booking_id).await?;

        match booking.status {
            BookingStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
            BookingStatus::Confirmed => {
                return Err(BookingError::DuplicateRequest(
                    "booking is already paid for".to_string(),
                ))
            }
            BookingStatus::Initiated | BookingStatus::Pending => {}
        }

        // Lazy expiry: the request-triggered twin of the scheduler sweep.
        // Both funnel through the conditioned transition, so racing them
        // is safe and seats are released exactly once.
        if Utc::now() - booking.created_at > self.expiry_window {
            return Err(self.expire_booking(&booking).await);
        }

        if amount != booking.total_cost {
            return Err(BookingError::AmountMismatch {
                expected: booking.total_cost,
                offered: amount,
            });
        }
        if user_id != booking.user_id {
            return Err(BookingError::Unauthorized);
        }

        match self
            .store
            .transition_from_initiated(booking_id, BookingStatus::Confirmed)
            .await?
        {
            Some(confirmed) => {
                info!(%booking_id, "booking confirmed");
                Ok(confirmed)
            }
            // A concurrent cancel or expiry committed first.
            None => Err(BookingError::AlreadyCancelled),
        }
    }

    /// Cancel an overdue booking and hand its seats back. Returns the
    /// error the payment attempt must surface.
    async fn expire_booking(&self, booking: &Booking) -> BookingError {
        match self
            .store
            .transition_from_initiated(booking.id, BookingStatus::Cancelled)
            .await
        {
            Ok(Some(_)) => {
                if let Err(err) = self
                    .inventory
                    .release_seats(booking.flight_id, booking.no_of_seats)
                    .await
                {
                    error!(
                        booking_id = %booking.id,
                        error = %err,
                        "seat release failed for expired booking; inventory needs reconciliation"
                    );
                }
                info!(booking_id = %booking.id, "booking expired on payment attempt");
            }
            // The sweep (or another request) got there first and already
            // handled the seats.
            Ok(None) => {}
            Err(err) => return err,
        }
        BookingError::BookingExpired
    }

    /// Idempotent cancellation: cancelling a CANCELLED booking is a no-op
    /// success; a CONFIRMED booking is terminal and cannot be cancelled.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> BookingResult<Booking> {
        let booking = self.store.get(booking_id).await?;

        match booking.status {
            BookingStatus::Cancelled => Ok(booking),
            BookingStatus::Confirmed => Err(BookingError::Validation(
                "a confirmed booking cannot be cancelled".to_string(),
            )),
            BookingStatus::Initiated | BookingStatus::Pending => {
                match self
                    .store
                    .transition_from_initiated(booking_id, BookingStatus::Cancelled)
                    .await?
                {
                    Some(cancelled) => {
                        // The transition winner is the only releaser.
                        self.inventory
                            .release_seats(cancelled.flight_id, cancelled.no_of_seats)
                            .await?;
                        info!(%booking_id, "booking cancelled, seats released");
                        Ok(cancelled)
                    }
                    None => {
                        let current = self.store.get(booking_id).await?;
                        if current.status == BookingStatus::Cancelled {
                            Ok(current)
                        } else {
                            Err(BookingError::Validation(
                                "a confirmed booking cannot be cancelled".to_string(),
                            ))
                        }
                    }
                }
            }
        }
    }

    /// Bulk expiry, invoked by the scheduler. One set-based update expires
    /// every stale INITIATED booking, then the held seats go back to
    /// inventory per booking. Returns the number of expired rows.
    pub async fn cancel_old_bookings(&self) -> BookingResult<u64> {
        let cutoff = Utc::now() - self.expiry_window;
        let expired = self.store.expire_stale_initiated(cutoff).await?;

        for booking in &expired {
            if let Err(err) = self
                .inventory
                .release_seats(booking.flight_id, booking.no_of_seats)
                .await
            {
                warn!(
                    booking_id = %booking.id,
                    flight_id = %booking.flight_id,
                    error = %err,
                    "seat release failed during expiry sweep; inventory needs reconciliation"
                );
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "expired stale bookings");
        }
        Ok(expired.len() as u64)
    }
}
