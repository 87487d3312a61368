use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skybook_core::booking::{Booking, BookingStatus, NewBooking};
use skybook_core::error::{BookingError, BookingResult};
use skybook_core::store::BookingStore;

pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    flight_id: Uuid,
    user_id: Uuid,
    no_of_seats: i32,
    total_cost: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> BookingResult<Booking> {
        let status = self
            .status
            .parse::<BookingStatus>()
            .map_err(BookingError::Internal)?;
        Ok(Booking {
            id: self.id,
            flight_id: self.flight_id,
            user_id: self.user_id,
            no_of_seats: self.no_of_seats,
            total_cost: self.total_cost,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn db_err(err: sqlx::Error) -> BookingError {
    BookingError::Internal(format!("database error: {err}"))
}

const BOOKING_COLUMNS: &str =
    "id, flight_id, user_id, no_of_seats, total_cost, status, created_at, updated_at";

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn create(&self, new_booking: NewBooking) -> BookingResult<Booking> {
        if new_booking.no_of_seats < 1 {
            return Err(BookingError::Validation(
                "noOfSeats must be at least 1".to_string(),
            ));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings ({BOOKING_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new_booking.flight_id)
        .bind(new_booking.user_id)
        .bind(new_booking.no_of_seats)
        .bind(new_booking.total_cost)
        .bind(BookingStatus::Initiated.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.into_booking()
    }

    async fn get(&self, id: Uuid) -> BookingResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.into_booking(),
            None => Err(BookingError::NotFound(format!("booking {id}"))),
        }
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        // Single-statement read-modify-write; concurrent writers on the
        // same id serialize on the row lock.
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.into_booking(),
            None => Err(BookingError::NotFound(format!("booking {id}"))),
        }
    }

    async fn transition_from_initiated(
        &self,
        id: Uuid,
        to: BookingStatus,
    ) -> BookingResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = 'INITIATED'
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn expire_stale_initiated(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', updated_at = $2
            WHERE status = 'INITIATED' AND created_at < $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(cutoff)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}
