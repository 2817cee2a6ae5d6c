//! Admission control for tool invocations.
//!
//! The governor bounds the number of simultaneous in-flight calls with a
//! semaphore and can additionally enforce a minimum spacing between calls
//! for one backend identity via a token bucket. Both waits share one
//! admission deadline; exceeding it yields [`ThrottledError`].
//!
//! An [`InvocationSlot`] is the held permit. Release is the drop: it happens
//! unconditionally on every exit path, including panics and cancellation,
//! which is what makes the no-leaked-permits property hold.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

/// Admission was not granted within the acquire timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("admission timed out after {waited_ms} ms")]
pub struct ThrottledError {
    pub waited_ms: u64,
}

/// A held permit for one in-flight invocation. Dropping it releases the
/// permit.
#[derive(Debug)]
pub struct InvocationSlot {
    _permit: OwnedSemaphorePermit,
}

/// Token bucket enforcing minimum spacing between calls.
///
/// Capacity one, refilled at one token per interval: the first call passes
/// immediately, subsequent calls wait out the remainder of the interval.
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(interval: Duration) -> Self {
        Self {
            tokens: 1.0,
            capacity: 1.0,
            refill_rate: 1.0 / interval.as_secs_f64().max(f64::EPSILON),
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    fn time_until_available(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            let needed = 1.0 - self.tokens;
            Duration::from_secs_f64(needed / self.refill_rate)
        }
    }
}

/// Bounds simultaneous invocations and per-identity call spacing.
pub struct Governor {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    acquire_timeout: Duration,
    spacing: Option<Duration>,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl Governor {
    pub fn new(
        max_concurrent: usize,
        acquire_timeout: Duration,
        spacing: Option<Duration>,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            acquire_timeout,
            spacing,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a slot, suspending until one is available or the acquire
    /// timeout elapses.
    ///
    /// The spacing bucket is consulted before the permit so a rate-limited
    /// caller never holds a slot while sleeping.
    pub async fn acquire(&self, identity: &str) -> Result<InvocationSlot, ThrottledError> {
        let started = Instant::now();
        let deadline = started + self.acquire_timeout;

        if let Some(spacing) = self.spacing {
            loop {
                let wait = {
                    let mut buckets = self.buckets.lock().unwrap();
                    let bucket = buckets
                        .entry(identity.to_string())
                        .or_insert_with(|| TokenBucket::new(spacing));
                    if bucket.try_acquire() {
                        break;
                    }
                    bucket.time_until_available()
                };

                if Instant::now() + wait > deadline {
                    debug!(identity, "rate spacing exceeds admission deadline");
                    return Err(self.throttled(started));
                }
                tokio::time::sleep(wait).await;
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, Arc::clone(&self.semaphore).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(InvocationSlot { _permit: permit }),
            // The semaphore is never closed; a closed error means the
            // governor is shutting down and admission is denied either way.
            Ok(Err(_)) | Err(_) => Err(self.throttled(started)),
        }
    }

    /// Number of slots currently held.
    pub fn active(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Number of slots currently available.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    fn throttled(&self, started: Instant) -> ThrottledError {
        ThrottledError {
            waited_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn governor(max: usize, acquire_ms: u64, spacing_ms: Option<u64>) -> Governor {
        Governor::new(
            max,
            Duration::from_millis(acquire_ms),
            spacing_ms.map(Duration::from_millis),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_and_drop_release() {
        let gov = governor(2, 1_000, None);
        assert_eq!(gov.active(), 0);

        let slot = gov.acquire("svc").await.unwrap();
        assert_eq!(gov.active(), 1);

        drop(slot);
        assert_eq!(gov.active(), 0);
        assert_eq!(gov.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out_when_full() {
        let gov = governor(1, 100, None);
        let _held = gov.acquire("svc").await.unwrap();

        let err = gov.acquire("svc").await.unwrap_err();
        assert!(err.waited_ms >= 100);
        assert_eq!(gov.active(), 1, "failed acquire must not consume a slot");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_admitted_when_slot_frees() {
        let gov = Arc::new(governor(1, 5_000, None));
        let held = gov.acquire("svc").await.unwrap();

        let waiter = tokio::spawn({
            let gov = Arc::clone(&gov);
            async move { gov.acquire("svc").await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(held);

        let slot = waiter.await.unwrap().unwrap();
        assert_eq!(gov.active(), 1);
        drop(slot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound_holds() {
        let gov = Arc::new(governor(3, 10_000, None));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let gov = Arc::clone(&gov);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _slot = gov.acquire("svc").await.unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3, "bound exceeded");
        assert_eq!(gov.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_delays_second_call() {
        let gov = governor(10, 10_000, Some(1_000));

        let start = Instant::now();
        let first = gov.acquire("svc").await.unwrap();
        drop(first);
        assert!(start.elapsed() < Duration::from_millis(10));

        let second = gov.acquire("svc").await.unwrap();
        drop(second);
        assert!(
            start.elapsed() >= Duration::from_millis(1_000),
            "second call must wait out the spacing interval"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_throttles_within_short_deadline() {
        let gov = governor(10, 100, Some(5_000));

        let first = gov.acquire("svc").await.unwrap();
        drop(first);

        let err = gov.acquire("svc").await.unwrap_err();
        assert!(err.waited_ms <= 100 + 1);
        assert_eq!(gov.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_is_per_identity() {
        let gov = governor(10, 100, Some(60_000));

        let a = gov.acquire("svc-a").await.unwrap();
        drop(a);
        // Different identity has its own bucket and is not delayed.
        let b = gov.acquire("svc-b").await.unwrap();
        drop(b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_does_not_leak() {
        let gov = Arc::new(governor(1, 60_000, None));
        let held = gov.acquire("svc").await.unwrap();

        let waiter = tokio::spawn({
            let gov = Arc::clone(&gov);
            async move {
                let _slot = gov.acquire("svc").await.unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        let _ = waiter.await;

        drop(held);
        assert_eq!(gov.available(), 1, "cancelled waiter must not hold a permit");
    }
}
