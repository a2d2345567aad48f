//! # fingerprint-sdk
//!
//! Async Rust client for the fingerprint identity API (fingerprints, visits, presence,
//! roles, tags, prices, impressions, API keys).
//!
//! ## Overview
//!
//! Resource calls are thin request/response plumbing. What the crate actually owns is
//! the rate-limit and retry core in [`resilience`]:
//!
//! - **Dual-window admission**: a per-minute and a per-hour fixed window, both must
//!   have room before a request is issued
//! - **Server-driven waits**: HTTP 429 responses honor `retry-after`
//! - **Exponential backoff**: 5xx and network failures retry after 1s, 2s, 4s, ...
//! - **Typed failures**: every terminal outcome is an [`Error`] variant, classified by
//!   [`Error::kind`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fingerprint_sdk::SdkClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> fingerprint_sdk::Result<()> {
//!     let client = SdkClientBuilder::new()
//!         .base_url("https://api.example.com/v1")
//!         .api_key("your-api-key")
//!         .rate_limits(60, 1000)
//!         .build()?;
//!
//!     let visits = client.visits().list(&[]).await?;
//!     println!("{visits}");
//!     println!("remaining: {:?}", client.remaining_requests());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resilience`] | Rate limit tracker, retry policy, executor, clock |
//! | [`client`] | Client builder, request helpers, resource handles |
//! | [`transport`] | reqwest-based HTTP transport and response classification |
//! | [`config`] | YAML / environment configuration |

pub mod client;
pub mod config;
pub mod resilience;
pub mod transport;

pub use client::{Resource, ResourceClient, SdkClient, SdkClientBuilder};
pub use config::SdkConfig;
pub use resilience::{
    Clock, ManualClock, RateLimitConfig, RateLimitTracker, RemainingRequests,
    ResilientRequestExecutor, RetryConfig, SystemClock,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};

pub use tokio_util::sync::CancellationToken;
