//! Admission control with a token bucket.
//!
//! Capacity equals the configured rate; tokens refill continuously at that
//! rate and never exceed capacity. Waiters queue on a FIFO async mutex and
//! sleep until the next token is due, so nobody spins and nobody starves.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::observability::metrics;

/// Returned by [`RateLimiter::acquire_timeout`] when no token arrived in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no admission token within {0:?}")]
pub struct AdmissionTimeout(pub Duration);

#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    /// Point from which the next token accrues.
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, now: Instant, capacity: u32, interval: Duration) {
        if self.tokens >= capacity {
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_nanos() / interval.as_nanos();
        if earned == 0 {
            return;
        }

        let room = u128::from(capacity - self.tokens);
        if earned >= room {
            self.tokens = capacity;
            self.last_refill = now;
        } else {
            // earned < room <= u32::MAX
            self.tokens += earned as u32;
            self.last_refill += interval * earned as u32;
        }
    }

    /// Take one token, or report how long until one is due.
    fn take(&mut self, now: Instant, capacity: u32, interval: Duration) -> Result<(), Duration> {
        self.refill(now, capacity, interval);
        if self.tokens > 0 {
            self.tokens -= 1;
            return Ok(());
        }
        let since = now.saturating_duration_since(self.last_refill);
        Err(interval.saturating_sub(since).max(Duration::from_nanos(1)))
    }
}

/// Token bucket limiter shared by every admission-checking caller.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    // FIFO: waiters are served in arrival order.
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// A limiter admitting `rate_per_second` requests per second, starting full.
    pub fn new(rate_per_second: NonZeroU32) -> Self {
        let capacity = rate_per_second.get();
        let interval = Duration::from_nanos((1_000_000_000 / u64::from(capacity)).max(1));
        Self {
            capacity,
            interval,
            bucket: Mutex::new(TokenBucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time between two refilled tokens.
    pub fn refill_interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        loop {
            match bucket.take(Instant::now(), self.capacity, self.interval) {
                Ok(()) => return,
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    /// No token is consumed on timeout.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<(), AdmissionTimeout> {
        tokio::time::timeout(timeout, self.acquire())
            .await
            .map_err(|_| AdmissionTimeout(timeout))
    }

    /// Take a token only if one is available now and nobody is queued.
    pub fn try_acquire(&self) -> bool {
        match self.bucket.try_lock() {
            Ok(mut bucket) => bucket.take(Instant::now(), self.capacity, self.interval).is_ok(),
            Err(_) => false,
        }
    }

    /// Tokens available right now, `None` while a caller holds the bucket.
    pub fn available(&self) -> Option<u32> {
        let mut bucket = self.bucket.try_lock().ok()?;
        bucket.refill(Instant::now(), self.capacity, self.interval);
        Some(bucket.tokens)
    }
}

/// State for the admission middleware.
#[derive(Debug, Clone)]
pub struct Admission {
    pub limiter: Arc<RateLimiter>,
    /// Upper bound on waiting; `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

/// Middleware function gating every request on the limiter.
pub async fn admission_middleware(
    State(admission): State<Admission>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();

    match admission.max_wait {
        None => admission.limiter.acquire().await,
        Some(max_wait) => {
            if let Err(e) = admission.limiter.acquire_timeout(max_wait).await {
                tracing::warn!(path = %request.uri().path(), error = %e, "Rate limit exceeded");
                metrics::record_rate_limited();
                return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
            }
        }
    }

    metrics::record_admission_wait(started.elapsed());
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rate: u32) -> RateLimiter {
        RateLimiter::new(NonZeroU32::new(rate).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_full_then_waits_for_refill() {
        let rl = limiter(4);
        assert_eq!(rl.refill_interval(), Duration::from_millis(250));

        let start = Instant::now();
        for _ in 0..4 {
            rl.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        rl.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_capacity() {
        let rl = limiter(2);
        rl.acquire().await;
        rl.acquire().await;
        assert_eq!(rl.available(), Some(0));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rl.available(), Some(2));
        assert!(rl.try_acquire());
        assert!(rl.try_acquire());
        assert!(!rl.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_refill_is_kept() {
        let rl = limiter(10); // 100ms per token
        for _ in 0..10 {
            rl.acquire().await;
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rl.try_acquire());
        assert!(!rl.try_acquire());

        // The 50ms already accrued toward the next token count.
        let start = Instant::now();
        rl.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_timeout() {
        let rl = limiter(1);
        rl.acquire().await;

        let err = rl.acquire_timeout(Duration::from_millis(100)).await.unwrap_err();
        assert_eq!(err, AdmissionTimeout(Duration::from_millis(100)));

        assert!(rl.acquire_timeout(Duration::from_secs(2)).await.is_ok());
    }

    #[test]
    fn test_bucket_take_reports_wait() {
        let now = Instant::now();
        let mut bucket = TokenBucket { tokens: 0, last_refill: now };
        let interval = Duration::from_millis(100);

        let wait = bucket.take(now + Duration::from_millis(30), 5, interval).unwrap_err();
        assert_eq!(wait, Duration::from_millis(70));

        assert!(bucket.take(now + Duration::from_millis(100), 5, interval).is_ok());
        assert_eq!(bucket.tokens, 0);
    }
}
