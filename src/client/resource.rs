//! Thin CRUD handles for the remote API's resource collections.
//!
//! Payload shapes belong to the remote API; callers pass and receive JSON values.

use crate::client::core::SdkClient;
use crate::Result;
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Fingerprints,
    Visits,
    Presence,
    Roles,
    Tags,
    Prices,
    Impressions,
    ApiKeys,
    System,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Fingerprints => "fingerprints",
            Resource::Visits => "visits",
            Resource::Presence => "presence",
            Resource::Roles => "roles",
            Resource::Tags => "tags",
            Resource::Prices => "prices",
            Resource::Impressions => "impressions",
            Resource::ApiKeys => "api-keys",
            Resource::System => "system",
        }
    }

    pub fn all() -> &'static [Resource] {
        &[
            Resource::Fingerprints,
            Resource::Visits,
            Resource::Presence,
            Resource::Roles,
            Resource::Tags,
            Resource::Prices,
            Resource::Impressions,
            Resource::ApiKeys,
            Resource::System,
        ]
    }
}

impl std::str::FromStr for Resource {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Resource::all()
            .iter()
            .copied()
            .find(|r| r.path() == s)
            .ok_or_else(|| {
                crate::Error::validation_with_context(
                    format!("unknown resource '{}'", s),
                    crate::ErrorContext::new().with_source("resource"),
                )
            })
    }
}

pub struct ResourceClient<'a> {
    client: &'a SdkClient,
    resource: Resource,
}

impl<'a> ResourceClient<'a> {
    pub(crate) fn new(client: &'a SdkClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource.path(), id)
    }

    pub async fn list(&self, query: &[(String, String)]) -> Result<Value> {
        let query = if query.is_empty() { None } else { Some(query) };
        self.client
            .request(Method::GET, self.resource.path(), query, None)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client
            .request(Method::GET, &self.item_path(id), None, None)
            .await
    }

    pub async fn create(&self, body: &Value) -> Result<Value> {
        self.client
            .request(Method::POST, self.resource.path(), None, Some(body))
            .await
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<Value> {
        self.client
            .request(Method::PUT, &self.item_path(id), None, Some(body))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &self.item_path(id), None, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths_round_trip() {
        for r in Resource::all() {
            assert_eq!(r.path().parse::<Resource>().unwrap(), *r);
        }
        assert_eq!(Resource::ApiKeys.path(), "api-keys");
        assert!("unknown".parse::<Resource>().is_err());
    }
}
