//! FusionAuth identity-provider API client
//!
//! `IdentityProviderApi` is the capability set the resource adapters need:
//! create, read, update and delete over opaque JSON payloads keyed by the
//! service identifier. `FusionAuthClient` binds it to the FusionAuth REST API.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use thiserror::Error;

use crate::config::FusionAuthConfig;

const IDENTITY_PROVIDER_PATH: &str = "api/identity-provider";
const TENANT_HEADER: &str = "X-FusionAuth-TenantId";

/// Errors returned by the HTTP client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The configured host does not form a usable URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Identity-provider endpoints of the remote service
#[async_trait]
pub trait IdentityProviderApi: Send + Sync {
    /// Create an identity provider; returns the response body
    async fn create_identity_provider(&self, body: Vec<u8>) -> ClientResult<Vec<u8>>;

    /// Fetch an identity provider by identifier; returns the response body
    async fn read_identity_provider(&self, id: &str) -> ClientResult<Vec<u8>>;

    /// Replace an identity provider; returns the response body
    async fn update_identity_provider(&self, body: Vec<u8>, id: &str) -> ClientResult<Vec<u8>>;

    /// Delete an identity provider
    async fn delete_identity_provider(&self, id: &str) -> ClientResult<()>;
}

/// REST client for the FusionAuth API
pub struct FusionAuthClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
    tenant_id: Option<String>,
}

impl FusionAuthClient {
    pub fn new(config: &FusionAuthConfig) -> ClientResult<Self> {
        let mut base_url = Url::parse(&config.host)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.host, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.host.clone()));
        }
        // join() replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url,
            api_key: config.api_key.clone(),
            tenant_id: config.tenant_id.clone(),
        })
    }

    fn endpoint(&self, id: Option<&str>) -> ClientResult<Url> {
        let mut url = self
            .base_url
            .join(IDENTITY_PROVIDER_PATH)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
                .push(id);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Vec<u8>> {
        let mut request = request.header(AUTHORIZATION, &self.api_key);
        if let Some(tenant_id) = &self.tenant_id {
            request = request.header(TENANT_HEADER, tenant_id);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("FusionAuth responded with status {}", status);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl IdentityProviderApi for FusionAuthClient {
    async fn create_identity_provider(&self, body: Vec<u8>) -> ClientResult<Vec<u8>> {
        let url = self.endpoint(None)?;
        debug!("POST {}", url);
        self.send(
            self.http_client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }

    async fn read_identity_provider(&self, id: &str) -> ClientResult<Vec<u8>> {
        let url = self.endpoint(Some(id))?;
        debug!("GET {}", url);
        self.send(self.http_client.get(url)).await
    }

    async fn update_identity_provider(&self, body: Vec<u8>, id: &str) -> ClientResult<Vec<u8>> {
        let url = self.endpoint(Some(id))?;
        debug!("PUT {}", url);
        self.send(
            self.http_client
                .put(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }

    async fn delete_identity_provider(&self, id: &str) -> ClientResult<()> {
        let url = self.endpoint(Some(id))?;
        debug!("DELETE {}", url);
        self.send(self.http_client.delete(url)).await.map(|_| ())
    }
}
