//! HTTP Transport
//!
//! Information Hiding:
//! - HTTP client implementation details hidden behind `Transport`
//! - Connection pooling handled by the shared reqwest client
//! - Timeout and connectivity errors classified, never retried

use super::HttpVerb;
use crate::error::TransportFailure;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tokio::time::{timeout, Duration};

/// Raw answer from the remote endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parsed JSON body, if the body is JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Outbound call contract consumed by the gateway.
///
/// Implementations must be safe for concurrent use by in-flight requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(
        &self,
        verb: HttpVerb,
        url: &str,
        query: &[(String, String)],
        body: Option<&Map<String, Value>>,
    ) -> Result<TransportResponse, TransportFailure>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    fn method(verb: HttpVerb) -> Method {
        match verb {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
            HttpVerb::Patch => Method::PATCH,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(
        &self,
        verb: HttpVerb,
        url: &str,
        query: &[(String, String)],
        body: Option<&Map<String, Value>>,
    ) -> Result<TransportResponse, TransportFailure> {
        tracing::info!("Making HTTP {} request to: {}", verb, url);

        let mut request = self.client.request(Self::method(verb), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let request_future = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(TransportResponse { status, body })
        };

        match timeout(self.timeout, request_future).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(TransportFailure::Timeout {
                timeout: self.timeout,
            }),
            Ok(Err(e)) => Err(TransportFailure::Connectivity(e.to_string())),
            Err(_) => Err(TransportFailure::Timeout {
                timeout: self.timeout,
            }),
        }
    }
}
