use async_trait::async_trait;
use tracing::debug;

use skybook_core::error::{BookingError, BookingResult};
use skybook_core::idempotency::IdempotencyGuard;

/// Durable idempotency keyspace backed by Redis. `SET NX` gives the atomic
/// check-and-set: exactly one of any number of concurrent callers with the
/// same key observes the insert. Keys survive process restarts and are
/// shared across service instances. No TTL is applied; eviction is an
/// operational concern.
pub struct RedisIdempotencyGuard {
    client: redis::Client,
}

impl RedisIdempotencyGuard {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    fn key(key: &str) -> String {
        format!("idempotency:{key}")
    }

    fn redis_err(err: redis::RedisError) -> BookingError {
        BookingError::Internal(format!("idempotency store error: {err}"))
    }
}

#[async_trait]
impl IdempotencyGuard for RedisIdempotencyGuard {
    async fn check_and_reserve(&self, key: &str) -> BookingResult<bool> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(Self::redis_err)?;

        let result: Option<String> = redis::cmd("SET")
            .arg(Self::key(key))
            .arg("consumed")
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::redis_err)?;

        let reserved = result.is_some();
        debug!(key, reserved, "idempotency check");
        Ok(reserved)
    }

    async fn forget(&self, key: &str) -> BookingResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(Self::redis_err)?;

        let _: () = redis::cmd("DEL")
            .arg(Self::key(key))
            .query_async(&mut conn)
            .await
            .map_err(Self::redis_err)?;
        Ok(())
    }
}
