//! HTTP ConfigStore Implementation
//!
//! [`HttpConfigStore`] talks to the management API over HTTP. Request
//! futures are cancel-on-drop, so a view navigating away simply drops its
//! pending calls; no state is written after cancellation.

use crate::api::config_store::ConfigStore;
use crate::api::error::ApiError;
use crate::api::types::{CreateConfigPayload, EntityRef, HostView, Paged};
use crate::models::{ConfigRevision, ConfigShortView, SchemaNode};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Revision lists are short views; one page covers any realistic history.
const LIST_PAGE_QUERY: &str = "offset=0&limit=1000";

/// Management API client for configuration endpoints
#[derive(Debug, Clone)]
pub struct HttpConfigStore {
    http: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl HttpConfigStore {
    /// Create a store for the given API root (e.g. `https://hub/api/v2/`)
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .user_agent("clusterhub-config/0.1")
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// Create a store from a base URL string
    pub fn from_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(Url::parse(base_url)?)
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::http(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.authorize(self.http.get(url)).send().await?;
        let response = self.check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "DELETE");
        let response = self.authorize(self.http.delete(url)).send().await?;
        self.check(response).await?;
        Ok(())
    }

    fn group_path(
        &self,
        entity: &EntityRef,
        path: Option<String>,
        what: &str,
    ) -> Result<String, ApiError> {
        path.ok_or_else(|| {
            ApiError::invalid_payload(format!(
                "{what} endpoint requires a config-group reference, got '{entity}'"
            ))
        })
    }
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    async fn fetch_schema(&self, entity: &EntityRef) -> Result<SchemaNode, ApiError> {
        let raw: Value = self.get_json(&entity.schema_path()).await?;
        SchemaNode::parse(raw).map_err(|e| ApiError::invalid_payload(e.to_string()))
    }

    async fn list_revisions(&self, entity: &EntityRef) -> Result<Vec<ConfigShortView>, ApiError> {
        let path = format!("{}?{}", entity.configs_path(), LIST_PAGE_QUERY);
        let page: Paged<ConfigShortView> = self.get_json(&path).await?;
        Ok(page.results)
    }

    async fn load_revision(&self, entity: &EntityRef, id: i64) -> Result<ConfigRevision, ApiError> {
        self.get_json(&entity.config_path(id)).await
    }

    async fn create_revision(
        &self,
        entity: &EntityRef,
        payload: &CreateConfigPayload,
    ) -> Result<ConfigRevision, ApiError> {
        self.post_json(&entity.configs_path(), payload).await
    }

    async fn list_group_hosts(&self, entity: &EntityRef) -> Result<Vec<HostView>, ApiError> {
        let path = self.group_path(entity, entity.hosts_path(), "hosts")?;
        self.get_json(&path).await
    }

    async fn list_host_candidates(&self, entity: &EntityRef) -> Result<Vec<HostView>, ApiError> {
        let path = self.group_path(entity, entity.host_candidates_path(), "host-candidates")?;
        self.get_json(&path).await
    }

    async fn add_group_host(&self, entity: &EntityRef, host_id: i64) -> Result<(), ApiError> {
        let path = self.group_path(entity, entity.hosts_path(), "hosts")?;
        self.post_body(&path, &serde_json::json!({ "hostId": host_id }))
            .await
    }

    async fn remove_group_host(&self, entity: &EntityRef, host_id: i64) -> Result<(), ApiError> {
        let path = self.group_path(entity, entity.host_path(host_id), "hosts")?;
        self.delete(&path).await
    }
}
