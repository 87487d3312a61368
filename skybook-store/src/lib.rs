pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod idempotency_repo;

pub use booking_repo::PostgresBookingStore;
pub use database::DbClient;
pub use idempotency_repo::RedisIdempotencyGuard;
