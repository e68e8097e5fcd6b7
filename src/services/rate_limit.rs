// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide request pacing for the Scoutbook API.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces outgoing requests at least `interval` apart.
///
/// The lock is held while sleeping, so concurrent callers queue up and each
/// one starts a full interval after the previous one.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous `wait()` has elapsed, then
    /// record now as the new baseline. Returns the recorded baseline.
    pub async fn wait(&self) -> Instant {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                tracing::debug!(wait_ms = wait_time.as_millis() as u64, "Waiting for rate limit");
                tokio::time::sleep(wait_time).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sequential_waits_are_spaced() {
        let interval = Duration::from_millis(40);
        let limiter = RateLimiter::new(interval);

        let mut starts = Vec::new();
        for _ in 0..4 {
            starts.push(limiter.wait().await);
        }

        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= interval,
                "gap {:?} shorter than {:?}",
                pair[1] - pair[0],
                interval
            );
        }
    }

    #[tokio::test]
    async fn test_concurrent_waits_are_serialized() {
        let interval = Duration::from_millis(30);
        let limiter = Arc::new(RateLimiter::new(interval));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.wait().await })
            })
            .collect();

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();

        // Three waits need at least two full intervals end to end.
        assert!(starts[2] - starts[0] >= interval * 2);
    }

    #[tokio::test]
    async fn test_wait_after_long_idle_does_not_sleep() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
