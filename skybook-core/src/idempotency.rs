use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BookingResult;

/// Tracks caller-supplied payment keys so a request is processed at most
/// once. `check_and_reserve` is a single atomic test-and-set: of two
/// concurrent calls with the same key, exactly one may be told to proceed.
#[async_trait]
pub trait IdempotencyGuard: Send + Sync {
    /// Returns `true` (proceed) for an unseen key, marking it seen in the
    /// same step; `false` (reject) for a key that was already reserved.
    async fn check_and_reserve(&self, key: &str) -> BookingResult<bool>;

    /// Drop a reservation after a failed attempt so the caller may retry
    /// with the same key. A completed payment never calls this.
    async fn forget(&self, key: &str) -> BookingResult<()>;
}

/// Process-local guard for tests and single-instance runs.
#[derive(Default)]
pub struct MemoryIdempotencyGuard {
    seen: Mutex<HashSet<String>>,
}

impl MemoryIdempotencyGuard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyGuard for MemoryIdempotencyGuard {
    async fn check_and_reserve(&self, key: &str) -> BookingResult<bool> {
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(seen.insert(key.to_string()))
    }

    async fn forget(&self, key: &str) -> BookingResult<()> {
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_reserve_is_rejected() {
        let guard = MemoryIdempotencyGuard::new();
        assert!(guard.check_and_reserve("pay-1").await.unwrap());
        assert!(!guard.check_and_reserve("pay-1").await.unwrap());
        assert!(guard.check_and_reserve("pay-2").await.unwrap());
    }

    #[tokio::test]
    async fn forget_frees_the_key() {
        let guard = MemoryIdempotencyGuard::new();
        assert!(guard.check_and_reserve("pay-1").await.unwrap());
        guard.forget("pay-1").await.unwrap();
        assert!(guard.check_and_reserve("pay-1").await.unwrap());
    }
}
