//! HTTP transport to a SPARQL query endpoint

use crate::{RemoteError, RemoteGraphConfig, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Raw response from a SPARQL endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlResponse {
    /// `Content-Type` header value, if present
    pub content_type: Option<String>,
    pub body: String,
}

impl SparqlResponse {
    pub fn new(content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

/// Sends a query to an endpoint and returns the raw response
///
/// Implementations map connection failures to [`RemoteError::Transport`] and
/// non-success statuses to [`RemoteError::Http`].
pub trait SparqlTransport: Send + Sync + fmt::Debug {
    fn post_query(&self, endpoint: &str, query: &str) -> Result<SparqlResponse>;
}

/// Accept header: JSON results preferred, XML results accepted
const ACCEPT_RESULTS: &str = "application/sparql-results+json, application/sparql-results+xml;q=0.9";

/// Blocking HTTP transport
///
/// POSTs `application/x-www-form-urlencoded` bodies with a single `query`
/// field, as defined by the SPARQL 1.1 protocol.
pub struct HttpTransport {
    client: Client,
    auth_token: Option<String>,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn from_config(config: &RemoteGraphConfig) -> Result<Self> {
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let request_timeout = Duration::from_millis(config.request_timeout_ms);

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_token: config.auth_token.clone(),
            request_timeout,
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("has_auth_token", &self.auth_token.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl SparqlTransport for HttpTransport {
    fn post_query(&self, endpoint: &str, query: &str) -> Result<SparqlResponse> {
        debug!(endpoint, query_len = query.len(), "posting SPARQL query");

        let mut request = self
            .client
            .post(endpoint)
            .header(ACCEPT, ACCEPT_RESULTS)
            .form(&[("query", query)]);

        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                RemoteError::transport(format!("SPARQL request timeout: {}", e))
            } else if e.is_connect() {
                RemoteError::transport(format!("Failed to connect to SPARQL endpoint: {}", e))
            } else {
                RemoteError::transport(format!("SPARQL request failed: {}", e))
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .map_err(|e| RemoteError::transport(format!("Failed to read SPARQL response: {}", e)))?;

        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(SparqlResponse { content_type, body })
    }
}
