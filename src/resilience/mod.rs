//! # Rate limiting and retry core
//!
//! Every outbound call made by [`SdkClient`](crate::client::SdkClient) passes through
//! this module.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`clock`] | Injectable time source (`SystemClock`, `ManualClock`) |
//! | [`rate_limiter`] | Dual fixed-window (minute, hour) request tracker |
//! | [`policy`] | Retry configuration and per-call backoff state |
//! | [`executor`] | Admission check + bounded retry loop around one operation |
//!
//! ```rust
//! use fingerprint_sdk::resilience::clock::SystemClock;
//! use fingerprint_sdk::resilience::executor::ResilientRequestExecutor;
//! use fingerprint_sdk::resilience::policy::RetryConfig;
//! use fingerprint_sdk::resilience::rate_limiter::{RateLimitConfig, RateLimitTracker};
//! use std::sync::Arc;
//!
//! # async fn run() -> fingerprint_sdk::Result<()> {
//! let tracker = RateLimitTracker::new(RateLimitConfig::new(60, 1000), Arc::new(SystemClock))?;
//! let executor = ResilientRequestExecutor::new(Arc::new(tracker), RetryConfig::default());
//!
//! let answer = executor.execute(|| async { Ok(42) }).await?;
//! assert_eq!(answer, 42);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod executor;
pub mod policy;
pub mod rate_limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use executor::ResilientRequestExecutor;
pub use policy::RetryConfig;
pub use rate_limiter::{
    RateLimitConfig, RateLimitSnapshot, RateLimitTracker, RateLimitWindow, RemainingRequests,
};
