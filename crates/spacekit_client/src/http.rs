//! HTTP request executor.
//!
//! The HTTP library sits behind [`HttpClient`] so the executor's URL
//! building, status mapping and decoding can be exercised without one.
//! [`ReqwestClient`] is the production implementation.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::executor::RequestExecutor;
use async_trait::async_trait;
use spacekit_protocol::{ApiError, Request, ResponsePage};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest body excerpt carried by [`ClientError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends an authenticated GET request.
    async fn get(
        &self,
        url: &str,
        parameters: &BTreeMap<String, String>,
        access_token: &str,
    ) -> ClientResult<HttpResponse>;
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::transport_fatal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(
        &self,
        url: &str,
        parameters: &BTreeMap<String, String>,
        access_token: &str,
    ) -> ClientResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .query(parameters)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_builder() {
        ClientError::transport_fatal(err.to_string())
    } else {
        ClientError::transport_retryable(err.to_string())
    }
}

/// [`RequestExecutor`] that talks HTTP to one space environment.
pub struct HttpExecutor<C: HttpClient> {
    client: C,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl HttpExecutor<ReqwestClient> {
    /// Creates an executor using reqwest.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(config, ReqwestClient::new(config.timeout)?))
    }
}

impl<C: HttpClient> HttpExecutor<C> {
    /// Creates an executor over any HTTP client.
    pub fn new(config: &ClientConfig, client: C) -> Self {
        Self {
            client,
            base_url: config.base_url(),
            access_token: config.access_token.clone(),
            timeout: config.timeout,
        }
    }

    /// The environment URL requests are sent below.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a request.
    pub fn url_for(&self, request: &Request) -> String {
        format!("{}{}", self.base_url, request.path)
    }
}

#[async_trait]
impl<C: HttpClient> RequestExecutor for HttpExecutor<C> {
    async fn execute(&self, request: &Request) -> ClientResult<ResponsePage> {
        let url = self.url_for(request);
        debug!(url = %url, parameters = request.parameters.len(), "sending request");

        let response = tokio::time::timeout(
            self.timeout,
            self.client.get(&url, &request.parameters, &self.access_token),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        if !response.is_success() {
            let err = error_from_response(&response);
            warn!(url = %url, status = response.status, error = %err, "request failed");
            return Err(err);
        }

        Ok(ResponsePage::from_slice(&response.body)?)
    }
}

fn error_from_response(response: &HttpResponse) -> ClientError {
    match ApiError::from_slice(&response.body) {
        Some(error) => ClientError::Api {
            status: response.status,
            error,
        },
        None => {
            let text = String::from_utf8_lossy(&response.body);
            ClientError::Http {
                status: response.status,
                message: text.chars().take(MAX_ERROR_BODY).collect(),
            }
        }
    }
}
