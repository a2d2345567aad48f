//! SDK configuration
//!
//! Loaded from YAML or from `FP_SDK_*` environment variables. camelCase option names
//! (`maxRequestsPerMinute`, ...) are accepted as aliases.

use crate::resilience::policy::RetryConfig;
use crate::resilience::rate_limiter::RateLimitConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    #[serde(alias = "baseUrl")]
    pub base_url: String,
    #[serde(alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(alias = "maxRequestsPerMinute")]
    pub max_requests_per_minute: u32,
    #[serde(alias = "maxRequestsPerHour")]
    pub max_requests_per_hour: u32,
    #[serde(alias = "maxRetries")]
    pub max_retries: u32,
    #[serde(alias = "baseRetryDelayMs")]
    pub base_retry_delay_ms: u64,
    #[serde(alias = "timeoutSecs")]
    pub timeout_secs: u64,
    pub debug: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            max_requests_per_minute: 60,
            max_requests_per_hour: 1000,
            max_retries: 3,
            base_retry_delay_ms: 1000,
            timeout_secs: 30,
            debug: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name).ok().map(|s| {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

impl SdkConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse without validating; fields may still be filled in by env overrides.
    pub fn parse_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| {
            Error::configuration_with_context(
                "failed to parse config",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg = Self::parse_yaml_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// YAML file, then `FP_SDK_*` overrides, then validation.
    pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::parse_yaml_str(&raw)?.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by whatever `FP_SDK_*` variables are set.
    pub fn from_env() -> Result<Self> {
        let cfg = Self::default().apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("FP_SDK_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(key) = env::var("FP_SDK_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Some(v) = env_parse("FP_SDK_MAX_REQUESTS_PER_MINUTE") {
            self.max_requests_per_minute = v;
        }
        if let Some(v) = env_parse("FP_SDK_MAX_REQUESTS_PER_HOUR") {
            self.max_requests_per_hour = v;
        }
        if let Some(v) = env_parse("FP_SDK_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parse("FP_SDK_BASE_RETRY_DELAY_MS") {
            self.base_retry_delay_ms = v;
        }
        if let Some(v) = env_parse("FP_SDK_HTTP_TIMEOUT_SECS") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_bool("FP_SDK_DEBUG") {
            self.debug = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "base_url is required",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("config_loader"),
            ));
        }
        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(Error::configuration_with_context(
                "base_url is not a valid URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            ));
        }
        self.rate_limit_config().validate()
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.max_requests_per_minute, self.max_requests_per_hour)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_retry_delay_ms))
            .with_debug(self.debug)
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SdkConfig::default();
        assert_eq!(cfg.max_requests_per_minute, 60);
        assert_eq!(cfg.max_requests_per_hour, 1000);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.base_retry_delay_ms, 1000);
        assert!(!cfg.debug);
    }

    #[test]
    fn test_yaml_snake_case() {
        let cfg = SdkConfig::from_yaml_str(
            "base_url: https://api.example.com/v1/\nmax_requests_per_minute: 5\nmax_requests_per_hour: 100\n",
        )
        .unwrap();
        assert_eq!(cfg.rate_limit_config(), RateLimitConfig::new(5, 100));
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn test_yaml_camel_case_aliases() {
        let cfg = SdkConfig::from_yaml_str(
            "baseUrl: https://api.example.com\nmaxRequestsPerMinute: 10\nmaxRequestsPerHour: 20\nmaxRetries: 1\nbaseRetryDelayMs: 250\ndebug: true\n",
        )
        .unwrap();
        let retry = cfg.retry_config();
        assert_eq!(retry.max_retries, 1);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
        assert!(retry.debug);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SdkConfig::default().validate().is_err());
        assert!(SdkConfig::new("not a url").validate().is_err());

        let mut cfg = SdkConfig::new("https://api.example.com");
        cfg.max_requests_per_hour = 0;
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("max_requests_per_hour")
        );
    }

    #[test]
    fn test_yaml_parse_error_is_configuration() {
        let err = SdkConfig::from_yaml_str("max_requests_per_minute: [nope").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_env_override_completes_partial_file() {
        let path = std::env::temp_dir().join(format!("fp-sdk-{}.yaml", std::process::id()));
        std::fs::write(&path, "max_requests_per_minute: 7\n").unwrap();

        assert!(SdkConfig::from_yaml_file(&path).is_err());

        std::env::set_var("FP_SDK_BASE_URL", "https://env.example.com");
        let loaded = SdkConfig::load_yaml_file(&path);
        std::env::remove_var("FP_SDK_BASE_URL");
        std::fs::remove_file(&path).ok();

        let cfg = loaded.unwrap();
        assert_eq!(cfg.base_url, "https://env.example.com");
        assert_eq!(cfg.max_requests_per_minute, 7);
    }

    #[test]
    fn test_parse_yaml_str_defers_validation() {
        let cfg = SdkConfig::parse_yaml_str("max_retries: 1\n").unwrap();
        assert_eq!(cfg.max_retries, 1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_redacted() {
        let mut cfg = SdkConfig::new("https://api.example.com");
        cfg.api_key = Some("secret".into());
        assert_eq!(cfg.redacted().api_key.as_deref(), Some("***"));
    }
}
