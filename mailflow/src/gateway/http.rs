//! HTTP gateway implementation

use std::time::Duration;

use async_trait::async_trait;
use openapi_client::models::{
    ActivityResponse, AutomationListResponse, AutomationSummary, ErrorResponse,
};
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::AutomationError;
use crate::gateway::AutomationGateway;
use crate::models::automation::{AutomationDocument, AutomationId};
use crate::storage::settings::GatewaySettings;

/// Gateway backed by the automation REST API
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpGateway {
    /// Create a new gateway without credentials
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AutomationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a gateway from the settings file
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, AutomationError> {
        let mut gateway = Self::new(
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
        )?;
        gateway.token = settings
            .api_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()));
        Ok(gateway)
    }

    /// Send a bearer token with every request
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let request = self.client.request(method, &url);
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<T, AutomationError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => err.describe(),
                Err(_) => body,
            };
            error!("HTTP {} failed: {} - {}", method, status, message);
            return Err(AutomationError::Gateway(format!("{}: {}", status, message)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a GET request
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AutomationError> {
        self.execute("GET", self.request(Method::GET, path)).await
    }

    /// Make a POST request
    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AutomationError> {
        self.execute("POST", self.request(Method::POST, path).json(body))
            .await
    }

    /// Make a POST request without a body
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, AutomationError> {
        self.execute("POST", self.request(Method::POST, path)).await
    }

    /// Make a PUT request
    async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AutomationError> {
        self.execute("PUT", self.request(Method::PUT, path).json(body))
            .await
    }
}

fn automation_path(id: &AutomationId) -> String {
    format!("/automations/{}", id)
}

#[async_trait]
impl AutomationGateway for HttpGateway {
    async fn list(&self) -> Result<Vec<AutomationSummary>, AutomationError> {
        let response: AutomationListResponse = self.get_json("/automations").await?;
        Ok(response.automations)
    }

    async fn get(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError> {
        self.get_json(&automation_path(id)).await
    }

    async fn create(&self, doc: &AutomationDocument) -> Result<AutomationDocument, AutomationError> {
        self.post_json("/automations", &doc.payload()).await
    }

    async fn update(
        &self,
        id: &AutomationId,
        doc: &AutomationDocument,
    ) -> Result<AutomationDocument, AutomationError> {
        self.put_json(&automation_path(id), &doc.payload()).await
    }

    async fn duplicate(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError> {
        self.post_empty(&format!("{}/duplicate", automation_path(id)))
            .await
    }

    async fn start(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError> {
        self.post_empty(&format!("{}/start", automation_path(id)))
            .await
    }

    async fn pause(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError> {
        self.post_empty(&format!("{}/pause", automation_path(id)))
            .await
    }
}
