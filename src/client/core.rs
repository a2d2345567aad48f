use crate::client::resource::{Resource, ResourceClient};
use crate::config::SdkConfig;
use crate::resilience::executor::ResilientRequestExecutor;
use crate::resilience::rate_limiter::{RateLimitSnapshot, RemainingRequests};
use crate::transport::HttpTransport;
use crate::Result;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client for the remote API. Every call goes through the rate limiter and retry loop.
pub struct SdkClient {
    pub(crate) config: SdkConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) executor: ResilientRequestExecutor,
}

impl SdkClient {
    pub fn builder() -> crate::client::SdkClientBuilder {
        crate::client::SdkClientBuilder::new()
    }

    /// Build from `FP_SDK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        crate::client::SdkClientBuilder::from_config(SdkConfig::from_env()?).build()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn executor(&self) -> &ResilientRequestExecutor {
        &self.executor
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.request_with_cancel(method, path, query, body, &CancellationToken::new())
            .await
    }

    pub async fn request_with_cancel(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&serde_json::Value>,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value> {
        let transport: &HttpTransport = &self.transport;
        self.executor
            .execute_with_cancel(
                move || transport.send_json(method.clone(), path, query, body),
                cancel,
            )
            .await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let v = self.request(Method::GET, path, None, None).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let v = self.request(Method::POST, path, None, Some(&body)).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let v = self.request(Method::PUT, path, None, Some(&body)).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None, None).await?;
        Ok(())
    }

    pub fn resource(&self, resource: Resource) -> ResourceClient<'_> {
        ResourceClient::new(self, resource)
    }

    pub fn fingerprints(&self) -> ResourceClient<'_> {
        self.resource(Resource::Fingerprints)
    }

    pub fn visits(&self) -> ResourceClient<'_> {
        self.resource(Resource::Visits)
    }

    pub fn can_make_request(&self) -> bool {
        self.executor.tracker().can_make_request()
    }

    pub fn remaining_requests(&self) -> RemainingRequests {
        self.executor.tracker().remaining_requests()
    }

    /// Epoch ms at which the next request will be admitted.
    pub fn next_allowed_time(&self) -> u64 {
        self.executor.tracker().next_allowed_time()
    }

    pub fn rate_limit_snapshot(&self) -> RateLimitSnapshot {
        self.executor.tracker().snapshot()
    }
}
