use crate::client::core::SdkClient;
use crate::config::SdkConfig;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::executor::ResilientRequestExecutor;
use crate::resilience::rate_limiter::RateLimitTracker;
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;

/// Builder for [`SdkClient`].
///
/// Keep this surface area small and predictable.
pub struct SdkClientBuilder {
    config: SdkConfig,
    clock: Option<Arc<dyn Clock>>,
    tracker: Option<Arc<RateLimitTracker>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl SdkClientBuilder {
    pub fn new() -> Self {
        Self::from_config(SdkConfig::default())
    }

    pub fn from_config(config: SdkConfig) -> Self {
        Self {
            config,
            clock: None,
            tracker: None,
            base_url_override: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn rate_limits(mut self, per_minute: u32, per_hour: u32) -> Self {
        self.config.max_requests_per_minute = per_minute;
        self.config.max_requests_per_hour = per_hour;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn base_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.base_retry_delay_ms = ms;
        self
    }

    pub fn debug(mut self, enable: bool) -> Self {
        self.config.debug = enable;
        self
    }

    /// Inject a time source. Default is [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share one tracker between several clients so they draw from the same quota.
    ///
    /// The tracker's own limits and clock take precedence over the config and `clock`.
    pub fn shared_tracker(mut self, tracker: Arc<RateLimitTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Override the configured base URL.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<SdkClient> {
        let mut config = self.config;
        if let Some(url) = self.base_url_override {
            config.base_url = url;
        }
        config.validate()?;

        let tracker = match self.tracker {
            Some(t) => t,
            None => {
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                Arc::new(RateLimitTracker::new(config.rate_limit_config(), clock)?)
            }
        };

        let transport = Arc::new(HttpTransport::new(&config)?);
        let executor = ResilientRequestExecutor::new(tracker, config.retry_config());

        tracing::debug!(
            base_url = config.base_url.as_str(),
            per_minute = config.max_requests_per_minute,
            per_hour = config.max_requests_per_hour,
            max_retries = config.max_retries,
            "sdk client built"
        );

        Ok(SdkClient {
            config,
            transport,
            executor,
        })
    }
}

impl Default for SdkClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
