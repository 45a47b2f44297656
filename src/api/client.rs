use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use super::{extract_collection, Endpoint, Envelope};
use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::fetcher::LoadParams;
use crate::i18n::Lang;
use crate::model::Recipe;

/// HTTP client for the recipe platform backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    generation_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let client = Client::builder()
            .user_agent(concat!("recipe-portal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PortalError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            generation_timeout: config.generation_timeout(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let defaults = PortalConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: defaults.request_timeout(),
            generation_timeout: defaults.generation_timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of a collection endpoint and unwrap its envelope.
    pub async fn fetch_collection(
        &self,
        endpoint: Endpoint,
        params: &LoadParams,
    ) -> Result<Envelope, PortalError> {
        let body = self.get(endpoint.path(), endpoint, &params.query_pairs()).await?;
        extract_collection(&body, endpoint.collection_keys())
    }

    /// Fetch a single recipe by identifier.
    pub async fn fetch_recipe(&self, id: &str, lang: Lang) -> Result<Recipe, PortalError> {
        let path = format!("{}/{}", Endpoint::Recipes.path(), id);
        let query = [("lang", lang.code().to_string())];
        let body = self.get(&path, Endpoint::Recipes, &query).await?;

        let data = body.get("data").unwrap_or(&body);
        let raw = data
            .get("recipe")
            .or_else(|| data.get("meal"))
            .unwrap_or(data);

        Recipe::from_value(raw)
            .ok_or_else(|| PortalError::Malformed(format!("no recipe object for id {id}")))
    }

    pub async fn get(
        &self,
        path: &str,
        endpoint: Endpoint,
        query: &[(&str, String)],
    ) -> Result<Value, PortalError> {
        debug!("{} {}{} {:?}", endpoint.method(), self.base_url, path, query);
        self.send(endpoint, self.request(endpoint, path).query(query)).await
    }

    pub async fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Value, PortalError> {
        debug!("{} {}{} {}", endpoint.method(), self.base_url, endpoint.path(), body);
        self.send(endpoint, self.request(endpoint, endpoint.path()).json(body)).await
    }

    fn request(&self, endpoint: Endpoint, path: &str) -> RequestBuilder {
        self.client
            .request(endpoint.method(), format!("{}{}", self.base_url, path))
    }

    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<Value, PortalError> {
        let timeout = if endpoint.is_generation() {
            self.generation_timeout
        } else {
            self.timeout
        };

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with status {}", endpoint.path(), status);
            return Err(PortalError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        debug!("{} response: {}", endpoint.path(), text);

        Ok(serde_json::from_str(&text)?)
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> PortalError {
    if err.is_timeout() {
        PortalError::Timeout(timeout.as_secs())
    } else if err.is_decode() {
        PortalError::Malformed(err.to_string())
    } else {
        PortalError::Network(err.to_string())
    }
}
