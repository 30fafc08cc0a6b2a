use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{CanonicalCategory, CanonicalProject},
    normalize::Normalizer,
    protocol::{CmsResponse, ContactFields, ContactMessageRequest, Envelope},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::portfolio::PortfolioState;

pub const PROJECTS_PATH: &str = "/project?populate=*";
pub const CATEGORIES_PATH: &str = "/projects-categorie";
pub const RESUME_PATH: &str = "/my-cv?populate=*";
pub const CONTACTS_PATH: &str = "/contacts";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    Status(StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid header override {name}: {reason}")]
    Header { name: String, reason: String },
}

/// Per-call overrides. Headers are merged over the JSON defaults and win on
/// conflict.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn header_map(&self) -> std::result::Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| GatewayError::Header {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| GatewayError::Header {
                name: name.clone(),
                reason: err.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

/// Write side of the gateway as seen by the contact form.
#[async_trait]
pub trait ContactSubmitter: Send + Sync {
    async fn submit(&self, fields: &ContactFields) -> Result<Envelope<Option<Value>>>;
}

/// HTTP client for the CMS. Every operation resolves to an [`Envelope`];
/// transport and decode failures never escape as errors.
#[derive(Clone)]
pub struct CmsGateway {
    http: Client,
    base_url: String,
    normalizer: Normalizer,
}

impl CmsGateway {
    pub fn new(base_url: impl Into<String>, normalizer: Normalizer) -> Self {
        Self::with_client(Client::new(), base_url, normalizer)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, normalizer: Normalizer) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            normalizer,
        }
    }

    pub async fn list_projects(&self, options: &RequestOptions) -> Envelope<Vec<CanonicalProject>> {
        self.fetch_list(PROJECTS_PATH, "projects", options)
            .await
            .map(|raw| self.normalizer.projects(&raw))
    }

    pub async fn list_categories(
        &self,
        options: &RequestOptions,
    ) -> Envelope<Vec<CanonicalCategory>> {
        self.fetch_list(CATEGORIES_PATH, "categories", options)
            .await
            .map(|raw| self.normalizer.categories(&raw))
    }

    /// Raw résumé record; the file URL sits at `my_cv.url`.
    pub async fn fetch_resume(&self, options: &RequestOptions) -> Envelope<Option<Value>> {
        self.fetch_single(Method::GET, RESUME_PATH, None::<&()>, "resume", options)
            .await
    }

    pub async fn submit_contact_message(
        &self,
        fields: &ContactFields,
        options: &RequestOptions,
    ) -> Envelope<Option<Value>> {
        let body = ContactMessageRequest {
            data: fields.trimmed(),
        };
        self.fetch_single(Method::POST, CONTACTS_PATH, Some(&body), "contact", options)
            .await
    }

    /// Fetches projects and categories concurrently. Either failure fails the
    /// whole load and no partial data is kept.
    pub async fn load_portfolio(&self, options: &RequestOptions) -> PortfolioState {
        let (projects, categories) = futures::join!(
            self.list_projects(options),
            self.list_categories(options)
        );
        PortfolioState::from_envelopes(projects, categories)
    }

    async fn fetch_list(
        &self,
        path: &str,
        resource: &'static str,
        options: &RequestOptions,
    ) -> Envelope<Vec<Value>> {
        match self.request(Method::GET, path, None::<&()>, options).await {
            Ok(response) => {
                let meta = response.meta_object();
                Envelope::ok(response.into_list(), meta)
            }
            Err(error) => {
                warn!(resource, %error, "error fetching cms list");
                Envelope::failure(error.to_string(), Vec::new())
            }
        }
    }

    async fn fetch_single<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        resource: &'static str,
        options: &RequestOptions,
    ) -> Envelope<Option<Value>> {
        match self.request(method, path, body, options).await {
            Ok(response) => {
                let meta = response.meta_object();
                Envelope::ok(response.into_single(), meta)
            }
            Err(error) => {
                warn!(resource, %error, "error calling cms");
                Envelope::failure(error.to_string(), None)
            }
        }
    }

    async fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> std::result::Result<CmsResponse, GatewayError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        info!(%method, %url, "cms request");

        let mut request = self
            .http
            .request(method, &url)
            .headers(options.header_map()?);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ContactSubmitter for CmsGateway {
    async fn submit(&self, fields: &ContactFields) -> Result<Envelope<Option<Value>>> {
        Ok(self
            .submit_contact_message(fields, &RequestOptions::default())
            .await)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
