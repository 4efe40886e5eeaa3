//! Cancellation and deadline context
//!
//! A [`Context`] bounds a unit of async work. It carries an optional
//! [`CancellationToken`] and an optional deadline; [`Context::background`]
//! carries neither and never interrupts anything.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] stopped the work it was bounding
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Context {
    /// An unbounded context
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Keeps the earlier deadline if one is already set
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Deadline `timeout` from now. A timeout past the end of the clock
    /// leaves the context without one.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.cancel.as_ref().is_some_and(|token| token.is_cancelled())
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drive `future` to completion unless the context is cancelled or its
    /// deadline passes first, in which case the future is dropped.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Interrupted> {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_context_runs_to_completion() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.run(async { 42 }).await, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_future() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let started = Instant::now();

        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await;

        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(ctx.is_done());
    }

    #[tokio::test]
    async fn test_cancellation_interrupts() {
        let token = CancellationToken::new();
        let ctx = Context::background().with_cancellation(token.clone());
        token.cancel();

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Cancelled));
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_timeout_has_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));

        let bounded = Context::background()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(30));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(10)));
    }
}
