/// Domain error taxonomy for the booking service. Every variant carries a
/// stable status classification so the transport layer can surface it
/// without inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Not enough seats available: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },
    #[error("Payment amount {offered} does not match booking total {expected}")]
    AmountMismatch { expected: i64, offered: i64 },
    #[error("Booking does not belong to this user")]
    Unauthorized,
    #[error("Booking is already cancelled")]
    AlreadyCancelled,
    #[error("Booking expired before payment was made")]
    BookingExpired,
    #[error("Duplicate request: {0}")]
    DuplicateRequest(String),
    #[error("Flight service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl BookingError {
    /// HTTP-equivalent status classification, stable per error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_)
            | BookingError::InsufficientSeats { .. }
            | BookingError::AmountMismatch { .. } => 400,
            BookingError::Unauthorized => 401,
            BookingError::NotFound(_) => 404,
            BookingError::DuplicateRequest(_) | BookingError::AlreadyCancelled => 409,
            BookingError::BookingExpired => 410,
            BookingError::Unavailable(_) => 503,
            BookingError::Internal(_) => 500,
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_is_stable() {
        assert_eq!(BookingError::Validation("x".into()).status_code(), 400);
        assert_eq!(
            BookingError::InsufficientSeats {
                requested: 5,
                available: 2
            }
            .status_code(),
            400
        );
        assert_eq!(
            BookingError::AmountMismatch {
                expected: 100,
                offered: 90
            }
            .status_code(),
            400
        );
        assert_eq!(BookingError::Unauthorized.status_code(), 401);
        assert_eq!(BookingError::NotFound("x".into()).status_code(), 404);
        assert_eq!(BookingError::DuplicateRequest("x".into()).status_code(), 409);
        assert_eq!(BookingError::AlreadyCancelled.status_code(), 409);
        assert_eq!(BookingError::BookingExpired.status_code(), 410);
        assert_eq!(BookingError::Unavailable("x".into()).status_code(), 503);
        assert_eq!(BookingError::Internal("x".into()).status_code(), 500);
    }
}
