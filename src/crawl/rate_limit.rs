use std::time::Duration;
use tokio::time::Instant;

/// Keeps successive requests at least `interval` apart.
///
/// Only one request is in flight at a time, so the limiter just remembers when
/// the previous one started.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Wait until the next request may start, then mark it as started.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}
