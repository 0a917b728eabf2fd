//! Per-stream request pacing.
//!
//! A [`RequestThrottle`] belongs to one collection stream. It bounds how
//! often that stream issues requests; it does not coordinate with other
//! streams.

use std::time::Duration;

use tokio::time::Instant;

/// Delay between requests when nothing else is configured.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Enforces a minimum interval between consecutive requests of one stream.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestThrottle {
    /// Creates a throttle that has not issued any request yet.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// The configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous call, then
    /// records the current instant as the new request time.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                log::trace!("Throttling for {remaining:?}");
                tokio::time::sleep(remaining).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_not_delayed() {
        let mut throttle = RequestThrottle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_waits_for_the_interval() {
        let mut throttle = RequestThrottle::new(Duration::from_secs(5));
        throttle.wait().await;
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_once_interval_has_passed() {
        let mut throttle = RequestThrottle::new(Duration::from_secs(2));
        throttle.wait().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
