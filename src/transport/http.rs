use crate::config::SdkConfig;
use crate::{Error, ErrorContext, Result};
use reqwest::header::HeaderMap;
use reqwest::{Method, Proxy};
use std::env;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Single-attempt HTTP transport. Retries and admission live in the executor.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(cfg: &SdkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .pool_max_idle_per_host(
                env::var("FP_SDK_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("FP_SDK_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                "failed to build HTTP client",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> Result<url::Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        url::Url::parse(&joined).map_err(|e| {
            Error::validation_with_context(
                "invalid request URL",
                ErrorContext::new()
                    .with_field_path("path")
                    .with_details(format!("{}: {}", joined, e))
                    .with_source("http_transport"),
            )
        })
    }

    /// Perform one request and classify the outcome.
    ///
    /// - request build failure => `Error::Validation` (never retried)
    /// - send failure => `Error::Transport`
    /// - 429 => `Error::ServerRateLimited` (with `retry-after` seconds when present)
    /// - 5xx => `Error::Server`
    /// - other non-2xx => `Error::Remote`
    /// - 2xx with empty body => `Value::Null`
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = self.url_for(path)?;
        let request_id = Uuid::new_v4().to_string();

        let mut req = self
            .client
            .request(method.clone(), url)
            .header("accept", "application/json")
            .header("x-request-id", &request_id);

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(params) = query {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_builder() {
                // bad header value or query: resending cannot help
                Error::validation_with_context(
                    "request could not be built",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            } else {
                Error::Transport(TransportError::Http(e))
            }
        })?;
        let status = resp.status().as_u16();
        debug!(%method, path, status, request_id = request_id.as_str(), "http response");

        if resp.status().is_success() {
            let text = resp.text().await.map_err(TransportError::Http)?;
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let retry_after_secs = retry_after_secs(resp.headers());
        let message = resp.text().await.unwrap_or_default();

        Err(match status {
            429 => Error::ServerRateLimited {
                retry_after_secs,
                message,
            },
            500..=599 => Error::Server { status, message },
            _ => Error::Remote { status, message },
        })
    }
}

/// Extract the first non-empty header value from a list of header names.
fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Only the `Retry-After: <seconds>` form is supported; HTTP dates are ignored.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    header_first(headers, &["retry-after"])?.parse().ok()
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
