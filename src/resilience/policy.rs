use crate::error::ErrorKind;
use crate::Error;
use std::time::Duration;

use super::rate_limiter::MINUTE_WINDOW_MS;

/// Retry behavior for [`ResilientRequestExecutor`](super::executor::ResilientRequestExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// First exponential backoff delay; doubles on each server/network retry.
    pub base_delay: Duration,
    /// Wait used for HTTP 429 responses without a `retry-after` hint.
    pub rate_limit_delay: Duration,
    /// Log retry scheduling at info level.
    pub debug: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            rate_limit_delay: Duration::from_millis(MINUTE_WINDOW_MS),
            debug: false,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    /// Not retryable: surface the error as-is.
    Fail,
    /// Retryable, but the attempt budget is spent.
    Exhausted,
}

/// Per-`execute` bookkeeping. Discarded on success or exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RetryState {
    /// Attempts already made.
    pub attempt: u32,
    pub next_delay: Duration,
    pub max_attempts: u32,
}

impl RetryState {
    pub fn new(cfg: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            next_delay: cfg.base_delay,
            max_attempts: cfg.max_retries.saturating_add(1),
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Decide after a failed attempt. Call `record_attempt` first.
    pub fn on_failure(&mut self, err: &Error, cfg: &RetryConfig) -> Decision {
        let kind = err.kind();
        if !matches!(
            kind,
            ErrorKind::ServerRateLimited | ErrorKind::ServerError | ErrorKind::NetworkFailure
        ) {
            return Decision::Fail;
        }

        if self.attempt >= self.max_attempts {
            return Decision::Exhausted;
        }

        let delay = match kind {
            ErrorKind::ServerRateLimited => err.retry_after().unwrap_or(cfg.rate_limit_delay),
            _ => {
                let d = self.next_delay;
                self.next_delay = self.next_delay.saturating_mul(2);
                d
            }
        };
        Decision::Retry { delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    fn network() -> Error {
        Error::Transport(TransportError::Other("connection refused".into()))
    }

    fn fail_once(state: &mut RetryState, err: &Error, cfg: &RetryConfig) -> Decision {
        state.record_attempt();
        state.on_failure(err, cfg)
    }

    #[test]
    fn test_defaults() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.base_delay, Duration::from_secs(1));
        assert_eq!(cfg.rate_limit_delay, Duration::from_secs(60));
        assert_eq!(RetryState::new(&cfg).max_attempts, 4);
    }

    #[test]
    fn test_exponential_backoff_then_exhausted() {
        let cfg = RetryConfig::default();
        let mut st = RetryState::new(&cfg);
        let err = network();
        let delays: Vec<Decision> = (0..4).map(|_| fail_once(&mut st, &err, &cfg)).collect();
        assert_eq!(
            delays,
            vec![
                Decision::Retry { delay: Duration::from_millis(1000) },
                Decision::Retry { delay: Duration::from_millis(2000) },
                Decision::Retry { delay: Duration::from_millis(4000) },
                Decision::Exhausted,
            ]
        );
    }

    #[test]
    fn test_server_rate_limited_uses_hint_without_doubling() {
        let cfg = RetryConfig::default();
        let mut st = RetryState::new(&cfg);
        let limited = Error::ServerRateLimited {
            retry_after_secs: Some(7),
            message: String::new(),
        };
        assert_eq!(
            fail_once(&mut st, &limited, &cfg),
            Decision::Retry { delay: Duration::from_secs(7) }
        );
        // the backoff multiplier is untouched by the 429
        assert_eq!(
            fail_once(&mut st, &Error::Server { status: 500, message: String::new() }, &cfg),
            Decision::Retry { delay: Duration::from_millis(1000) }
        );
    }

    #[test]
    fn test_server_rate_limited_without_hint_uses_window() {
        let cfg = RetryConfig::default();
        let mut st = RetryState::new(&cfg);
        let limited = Error::ServerRateLimited {
            retry_after_secs: None,
            message: String::new(),
        };
        assert_eq!(
            fail_once(&mut st, &limited, &cfg),
            Decision::Retry { delay: Duration::from_millis(60_000) }
        );
    }

    #[test]
    fn test_non_retryable_kinds_fail_immediately() {
        let cfg = RetryConfig::default();
        let mut st = RetryState::new(&cfg);
        let others = [
            Error::Remote { status: 404, message: "missing".into() },
            Error::RateLimitExceeded { next_allowed_at_ms: 0, cause: None },
            Error::Cancelled,
        ];
        for err in &others {
            assert_eq!(fail_once(&mut st, err, &cfg), Decision::Fail);
        }
    }

    #[test]
    fn test_zero_retries_exhausts_on_first_failure() {
        let cfg = RetryConfig::new().with_max_retries(0);
        let mut st = RetryState::new(&cfg);
        assert_eq!(fail_once(&mut st, &network(), &cfg), Decision::Exhausted);
    }
}
