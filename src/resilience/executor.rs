//! Admission-controlled request execution with layered retries.

use crate::resilience::clock::Clock;
use crate::resilience::policy::{Decision, RetryConfig, RetryState};
use crate::resilience::rate_limiter::RateLimitTracker;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs caller-supplied operations behind a [`RateLimitTracker`] and a [`RetryConfig`].
///
/// Per call:
/// - admission is checked and recorded before every attempt; a denial is terminal and
///   carries the failure that prompted the retry
/// - HTTP 429 waits for `retry-after` (or the configured window), 5xx and network
///   failures back off exponentially
/// - attempts are strictly sequential and bounded by `max_retries + 1`
#[derive(Clone)]
pub struct ResilientRequestExecutor {
    tracker: Arc<RateLimitTracker>,
    clock: Arc<dyn Clock>,
    cfg: RetryConfig,
}

impl ResilientRequestExecutor {
    pub fn new(tracker: Arc<RateLimitTracker>, cfg: RetryConfig) -> Self {
        let clock = tracker.clock();
        Self {
            tracker,
            clock,
            cfg,
        }
    }

    pub fn tracker(&self) -> &Arc<RateLimitTracker> {
        &self.tracker
    }

    pub fn config(&self) -> &RetryConfig {
        &self.cfg
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_cancel(operation, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but stops as soon as `cancel` fires.
    ///
    /// A pending backoff timer is dropped; an in-flight operation future is dropped,
    /// which aborts it only as far as the operation itself supports.
    pub async fn execute_with_cancel<F, Fut, T>(
        &self,
        mut operation: F,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut state = RetryState::new(&self.cfg);
        let mut last_error: Option<Error> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if let Err(next_allowed_at_ms) = self.tracker.try_acquire() {
                debug!(
                    attempt = state.attempt,
                    next_allowed_at_ms, "request rejected by local rate limit"
                );
                return Err(Error::RateLimitExceeded {
                    next_allowed_at_ms,
                    cause: last_error.map(Box::new),
                });
            }

            state.record_attempt();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                r = operation() => r,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match state.on_failure(&err, &self.cfg) {
                Decision::Fail => return Err(err),
                Decision::Exhausted => {
                    warn!(
                        attempts = state.attempt,
                        kind = %err.kind(),
                        error = %err,
                        "giving up after max retries"
                    );
                    return Err(Error::MaxRetriesExceeded {
                        attempts: state.attempt,
                        source: Box::new(err),
                    });
                }
                Decision::Retry { delay } => {
                    let delay_ms = delay.as_millis() as u64;
                    if self.cfg.debug {
                        info!(attempt = state.attempt, delay_ms, kind = %err.kind(), error = %err, "retry scheduled");
                    } else {
                        debug!(attempt = state.attempt, delay_ms, kind = %err.kind(), "retry scheduled");
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = self.clock.sleep(delay) => {}
                    }
                    last_error = Some(err);
                }
            }
        }
    }
}

impl std::fmt::Debug for ResilientRequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientRequestExecutor")
            .field("tracker", &self.tracker)
            .field("cfg", &self.cfg)
            .finish()
    }
}
