use crate::resilience::clock::Clock;
use crate::{Error, ErrorContext, Result};
use std::sync::{Arc, Mutex, MutexGuard};

pub const MINUTE_WINDOW_MS: u64 = 60_000;
pub const HOUR_WINDOW_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests_per_minute: u32,
    pub max_requests_per_hour: u32,
}

impl RateLimitConfig {
    pub fn new(max_requests_per_minute: u32, max_requests_per_hour: u32) -> Self {
        Self {
            max_requests_per_minute,
            max_requests_per_hour,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests_per_minute == 0 {
            return Err(Error::configuration_with_context(
                "limit must be a positive integer",
                ErrorContext::new()
                    .with_field_path("max_requests_per_minute")
                    .with_source("rate_limit_tracker"),
            ));
        }
        if self.max_requests_per_hour == 0 {
            return Err(Error::configuration_with_context(
                "limit must be a positive integer",
                ErrorContext::new()
                    .with_field_path("max_requests_per_hour")
                    .with_source("rate_limit_tracker"),
            ));
        }
        Ok(())
    }
}

/// One fixed (non-sliding) counting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub count: u32,
    /// Epoch ms at which `count` is zeroed and a new period begins.
    pub reset_at_ms: u64,
    pub limit: u32,
    pub duration_ms: u64,
}

impl RateLimitWindow {
    fn new(limit: u32, duration_ms: u64, now_ms: u64) -> Self {
        Self {
            count: 0,
            reset_at_ms: now_ms.saturating_add(duration_ms),
            limit,
            duration_ms,
        }
    }

    fn refresh(&mut self, now_ms: u64) {
        if now_ms >= self.reset_at_ms {
            self.count = 0;
            self.reset_at_ms = now_ms.saturating_add(self.duration_ms);
        }
    }

    pub fn is_open(&self) -> bool {
        self.count < self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingRequests {
    pub minute: u32,
    pub hour: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimitSnapshot {
    pub now_ms: u64,
    pub minute: RateLimitWindow,
    pub hour: RateLimitWindow,
}

#[derive(Debug)]
struct Windows {
    minute: RateLimitWindow,
    hour: RateLimitWindow,
}

impl Windows {
    fn refresh(&mut self, now_ms: u64) {
        self.minute.refresh(now_ms);
        self.hour.refresh(now_ms);
    }

    fn admits(&self) -> bool {
        self.minute.is_open() && self.hour.is_open()
    }

    fn track(&mut self) {
        self.minute.count = self.minute.count.saturating_add(1);
        self.hour.count = self.hour.count.saturating_add(1);
    }

    fn next_allowed(&self, now_ms: u64) -> u64 {
        [&self.minute, &self.hour]
            .into_iter()
            .filter(|w| !w.is_open())
            .map(|w| w.reset_at_ms)
            .min()
            .unwrap_or(now_ms)
    }
}

/// Dual fixed-window request counter (per minute and per hour).
///
/// - Every public call first resets any window whose `reset_at_ms` has passed
/// - Admission requires both windows below their limit
/// - Safe to share across tasks; both windows sit behind one lock
pub struct RateLimitTracker {
    cfg: RateLimitConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<Windows>,
}

impl RateLimitTracker {
    pub fn new(cfg: RateLimitConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        cfg.validate()?;
        let now = clock.now_ms();
        let state = Mutex::new(Windows {
            minute: RateLimitWindow::new(cfg.max_requests_per_minute, MINUTE_WINDOW_MS, now),
            hour: RateLimitWindow::new(cfg.max_requests_per_hour, HOUR_WINDOW_MS, now),
        });
        Ok(Self { cfg, clock, state })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.cfg
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    // The windows are plain counters, so a poisoned lock still holds consistent data.
    fn refreshed(&self) -> (MutexGuard<'_, Windows>, u64) {
        let mut st = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let now = self.clock.now_ms();
        st.refresh(now);
        (st, now)
    }

    pub fn can_make_request(&self) -> bool {
        let (st, _) = self.refreshed();
        st.admits()
    }

    /// Record one request on both windows. Does not enforce the limit.
    pub fn track_request(&self) {
        let (mut st, _) = self.refreshed();
        st.track();
    }

    /// Check admission and record the request under a single lock.
    ///
    /// Returns the next allowed time (epoch ms) when the request is denied.
    pub fn try_acquire(&self) -> std::result::Result<(), u64> {
        let (mut st, now) = self.refreshed();
        if st.admits() {
            st.track();
            Ok(())
        } else {
            Err(st.next_allowed(now))
        }
    }

    pub fn remaining_requests(&self) -> RemainingRequests {
        let (st, _) = self.refreshed();
        RemainingRequests {
            minute: st.minute.remaining(),
            hour: st.hour.remaining(),
        }
    }

    /// `now` when a request would be admitted, otherwise the earliest reset among
    /// the blocking windows.
    pub fn next_allowed_time(&self) -> u64 {
        let (st, now) = self.refreshed();
        st.next_allowed(now)
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let (st, now) = self.refreshed();
        RateLimitSnapshot {
            now_ms: now,
            minute: st.minute,
            hour: st.hour,
        }
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}
