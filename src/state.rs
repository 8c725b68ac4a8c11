//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use crate::api::rate_limit::RateLimiter;
use crate::lifecycle::DeviceCoordinator;

#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<DeviceCoordinator>,
    pub rate_limiter: Arc<RateLimiter>,
    start_time: Instant,
}

impl GatewayState {
    pub fn new(coordinator: Arc<DeviceCoordinator>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            coordinator,
            rate_limiter,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
