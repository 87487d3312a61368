use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::engine::LifecycleEngine;

/// Fixed-interval background sweep that expires stale INITIATED bookings.
/// A failed tick is logged and retried on the next one; overlapping runs
/// are safe because the bulk update is idempotent per row.
pub struct ExpiryScheduler {
    engine: Arc<LifecycleEngine>,
    period: Duration,
}

impl ExpiryScheduler {
    pub fn new(engine: Arc<LifecycleEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "expiry scheduler started");
        let mut ticker = interval(self.period);
        loop {
            ticker.tick().await;
            match self.engine.cancel_old_bookings().await {
                Ok(0) => {}
                Ok(count) => info!(count, "expiry sweep cancelled old bookings"),
                Err(err) => error!(error = %err, "expiry sweep failed, will retry next tick"),
            }
        }
    }
}
