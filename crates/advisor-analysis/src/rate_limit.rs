//! Shared outbound request quota

use crate::error::{AdvisorError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-minute request quota shared by every data adapter
///
/// Construct once and clone into each client; clones draw from the same quota.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    limiter: Arc<DirectRateLimiter>,
    requests_per_minute: NonZeroU32,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Result<Self> {
        let rpm = NonZeroU32::new(requests_per_minute).ok_or_else(|| {
            AdvisorError::ConfigError("requests_per_minute must be greater than 0".to_string())
        })?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
            requests_per_minute: rpm,
        })
    }

    /// Wait until a request may be sent
    pub async fn until_ready(&self) {
        if self.limiter.check().is_err() {
            debug!(rpm = self.requests_per_minute.get(), "Rate limit reached, waiting");
            self.limiter.until_ready().await;
        }
    }

    /// Take a permit without waiting; false when the quota is spent
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute.get()
    }
}
