//! Retry-until-deadline combinator
//!
//! [`retry`] runs a fallible async operation until it succeeds or a maximum
//! wait elapses, sleeping between attempts according to a [`BackoffPolicy`].
//! It is independent of what is being retried, which keeps it testable with
//! tokio's paused clock and a fake flaky operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default delay before the second attempt
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);

/// Default growth factor applied to the delay after every failed attempt
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Default jitter, as a fraction of the current delay
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;

/// Default ceiling for a single delay (before jitter)
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Default total budget for one [`retry`] call
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Produces the delays between consecutive attempts
pub trait BackoffPolicy: Send {
    /// Delay to wait after the most recent failed attempt
    fn next_delay(&mut self) -> Duration;

    /// Start over from the first delay
    fn reset(&mut self);
}

/// Exponentially growing, randomized delays
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
    max_interval: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            max_interval: DEFAULT_MAX_INTERVAL,
            current: DEFAULT_INITIAL_INTERVAL,
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self.current = interval;
        self
    }

    /// Values below 1.0 are treated as 1.0 (constant delays)
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Clamped to `0.0..=1.0`; zero disables jitter
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let base = self.current.min(self.max_interval);
        let grown = (base.as_secs_f64() * self.multiplier).min(self.max_interval.as_secs_f64());
        self.current = Duration::from_secs_f64(grown);
        jitter(base, self.randomization_factor)
    }

    fn reset(&mut self) {
        self.current = self.initial_interval;
    }
}

/// The same delay between every attempt
#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff(pub Duration);

impl BackoffPolicy for ConstantBackoff {
    fn next_delay(&mut self) -> Duration {
        self.0
    }

    fn reset(&mut self) {}
}

fn jitter(base: Duration, factor: f64) -> Duration {
    if factor <= 0.0 || base.is_zero() {
        return base;
    }
    let secs = base.as_secs_f64();
    let delta = secs * factor;
    Duration::from_secs_f64(rand::thread_rng().gen_range((secs - delta)..=(secs + delta)))
}

/// Retry `operation` until it succeeds or `max_wait` has elapsed.
///
/// The first attempt runs immediately. After each failure the next delay is
/// taken from `policy` and clamped to the time left, so the final attempt
/// happens at the deadline. When an attempt fails at or past the deadline its
/// error is returned. The call therefore never gives up before `max_wait` and
/// overruns it by at most the duration of one attempt. A `max_wait` too large
/// to represent as an instant retries until the operation succeeds.
pub async fn retry<T, E, F, Fut, P>(mut policy: P, max_wait: Duration, mut operation: F) -> Result<T, E>
where
    P: BackoffPolicy,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let deadline = started.checked_add(max_wait);
    policy.reset();

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => {
                debug!(
                    attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "operation succeeded"
                );
                return Ok(value);
            }
            Err(error) => error,
        };

        let mut delay = policy.next_delay();
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    attempt,
                    max_wait_ms = max_wait.as_millis() as u64,
                    error = %error,
                    "giving up, maximum wait elapsed"
                );
                return Err(error);
            }
            delay = delay.min(deadline - now);
        }

        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[test]
    fn test_exponential_backoff_growth_without_jitter() {
        let mut backoff = ExponentialBackoff::new()
            .with_initial_interval(Duration::from_millis(100))
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(Duration::from_millis(500));

        let delays: Vec<_> = (0..5).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(500),
                Duration::from_millis(500),
            ]
        );

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff_jitter_bounds() {
        let mut backoff = ExponentialBackoff::new()
            .with_initial_interval(Duration::from_secs(1))
            .with_multiplier(1.0);

        for _ in 0..100 {
            let delay = backoff.next_delay();
            assert!(delay >= Duration::from_millis(500), "{:?}", delay);
            assert!(delay <= Duration::from_millis(1500), "{:?}", delay);
        }
    }

    #[test]
    fn test_backoff_builder_clamps() {
        let backoff = ExponentialBackoff::new()
            .with_multiplier(0.2)
            .with_randomization_factor(3.0);
        assert_eq!(backoff.multiplier, 1.0);
        assert_eq!(backoff.randomization_factor, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_flaky_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result: Result<&str, String> = retry(
            ConstantBackoff(Duration::from_secs(1)),
            Duration::from_secs(60),
            || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                        Err("not ready".to_string())
                    } else {
                        Ok("ready")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_at_deadline() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();
        let max_wait = Duration::from_secs(60);

        let result: Result<(), String> = retry(ExponentialBackoff::default(), max_wait, || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("attempt {} refused", n + 1))
            }
        })
        .await;

        let elapsed = started.elapsed();
        let attempts = calls.load(Ordering::SeqCst);
        assert_eq!(result.unwrap_err(), format!("attempt {} refused", attempts));
        assert!(attempts > 1);
        assert!(elapsed >= max_wait, "gave up early after {:?}", elapsed);
        assert!(elapsed <= max_wait + Duration::from_millis(2), "overran: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_deadline_includes_slow_final_attempt() {
        let started = Instant::now();

        let result: Result<(), &str> = retry(
            ConstantBackoff(Duration::from_secs(10)),
            Duration::from_secs(15),
            || async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Err("timeout")
            },
        )
        .await;

        // attempts end at 2s, 14s (sleep 10), 17s (sleep clamped to 1s)
        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_secs(17));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_zero_wait_runs_once() {
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = retry(ConstantBackoff(Duration::from_secs(1)), Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_unrepresentable_wait_is_unbounded() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<u32, &str> = retry(ConstantBackoff(Duration::from_secs(30)), Duration::MAX, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 4 {
                    Err("starting up")
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(4));
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_retry_logs_failed_attempts() {
        let calls = AtomicU32::new(0);

        let _: Result<(), &str> = retry(ConstantBackoff(Duration::from_millis(10)), Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("connection refused")
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(logs_contain("operation failed, retrying"));
        assert!(logs_contain("connection refused"));
    }
}
