pub mod booking;
pub mod error;
pub mod idempotency;
pub mod inventory;
pub mod store;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use error::{BookingError, BookingResult};
