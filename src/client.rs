//! Sends a [`ReportRequest`] and turns the reply into a [`ReportResult`].

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::request::{HttpRequest, ReportRequest, token_request};
use crate::types::{ReportResult, ReportRow};

/// Status and body of an HTTP reply, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Moves a request over the wire. Only transport failures are errors here;
/// HTTP status handling belongs to [`ReportClient`].
pub trait Transport {
    /// # Errors
    /// [`ReportError::Network`] when no response could be obtained.
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, ReportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, ReportError> {
        (**self).execute(request)
    }
}

/// Blocking HTTPS transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// # Errors
    /// [`ReportError::Network`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReportError::Network(Box::new(e)))?;
        Ok(Self::with_client(client))
    }

    /// Wraps a preconfigured client (proxy, TLS roots, timeouts).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, ReportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .header(AUTHORIZATION, &request.authorization)
            .header(ACCEPT, "application/json");
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        let response = builder
            .send()
            .map_err(|e| ReportError::Network(Box::new(e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ReportError::Network(Box::new(e)))?;
        Ok(RawResponse { status, body })
    }
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Deserialize)]
struct DeploymentStatusBody {
    data: Vec<DeploymentStatusEntry>,
}

#[derive(Deserialize)]
struct DeploymentStatusEntry {
    #[serde(rename = "type")]
    kind: EntryType,
    activecount: u64,
    count: u64,
}

#[derive(Deserialize)]
struct EntryType {
    label: String,
}

pub struct ReportClient<T> {
    transport: T,
}

impl<T: Transport> ReportClient<T> {
    pub fn new(transport: T) -> Self {
        ReportClient { transport }
    }

    /// Exchanges the Base64 `key:secret` credential for an access token with
    /// one client-credentials POST. The token is not cached or refreshed.
    ///
    /// # Errors
    /// Same status mapping as [`ReportClient::fetch`]; a bad token URL is a
    /// [`ReportError::Configuration`].
    pub fn access_token(&self, token_url: &str, credential: &str) -> Result<String, ReportError> {
        let request = token_request(token_url, credential)?;
        debug!(url = %request.url, "requesting access token");
        let body = self.send(&request)?;
        let token: TokenBody = serde_json::from_str(&body)?;
        Ok(token.access_token)
    }

    /// Issues a single request; nothing is retried or cached.
    ///
    /// # Errors
    /// - [`ReportError::Authentication`] on HTTP 401/403
    /// - [`ReportError::Api`] on any other non-2xx status
    /// - [`ReportError::MalformedResponse`] if a 2xx body does not decode
    /// - [`ReportError::Network`] from the transport
    pub fn fetch(&self, request: &ReportRequest) -> Result<ReportResult, ReportError> {
        debug!(url = %request.url, "requesting deployment status");
        let body = self.send(&request.to_http())?;
        let parsed: DeploymentStatusBody = serde_json::from_str(&body)?;
        Ok(parsed
            .data
            .into_iter()
            .map(|e| ReportRow::new(e.kind.label, e.activecount, e.count))
            .collect())
    }

    /// Body of a 2xx reply, otherwise the mapped error.
    fn send(&self, request: &HttpRequest) -> Result<String, ReportError> {
        let response = self.transport.execute(request)?;
        debug!(status = response.status, bytes = response.body.len(), "response received");

        match response.status {
            200..=299 => Ok(response.body),
            401 | 403 => {
                warn!(status = response.status, url = %request.url, "credentials rejected");
                Err(ReportError::Authentication {
                    status: response.status,
                })
            }
            status => Err(ReportError::Api {
                status,
                body: response.body,
            }),
        }
    }
}
