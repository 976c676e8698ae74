//! Sliding-window rate limiter for model calls.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Allows at most `max_requests` calls per `window`.
///
/// Callers over the limit wait until the oldest call leaves the window;
/// `acquire` never fails. `max_requests == 0` disables limiting.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Wait for a free slot, then record the call
    pub async fn acquire(&self) {
        if self.max_requests == 0 {
            return;
        }

        loop {
            let wait = {
                let mut requests = self.requests.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = requests.front() {
                    if now.duration_since(oldest) >= self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                if requests.len() < self.max_requests {
                    requests.push_back(now);
                    return;
                }
                match requests.front() {
                    Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };

            debug!("Rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
        }
    }
}
