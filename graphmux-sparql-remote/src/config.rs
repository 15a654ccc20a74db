//! Remote graph configuration

use crate::{RemoteError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`RemoteGraphConfig::max_isomorphic_candidates`]
pub const MAX_ISOMORPHIC_CANDIDATES_ENV: &str = "GRAPHMUX_MAX_ISOMORPHIC_CANDIDATES";

/// Default bound on disambiguation indexes for isomorphic blank nodes
pub const DEFAULT_MAX_ISOMORPHIC_CANDIDATES: u32 = 1000;

/// Configuration for a [`RemoteGraph`](crate::RemoteGraph)
///
/// # Example
///
/// ```
/// use graphmux_sparql_remote::RemoteGraphConfig;
///
/// let config = RemoteGraphConfig::new("http://dbpedia.org/sparql")
///     .with_auth_token("secret")
///     .with_request_timeout_ms(10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteGraphConfig {
    /// SPARQL query endpoint URL
    pub endpoint: String,

    /// Bearer token sent with every request (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Upper bound on disambiguation indexes among blank nodes with
    /// isomorphic contexts. Past the bound, identities may collide.
    pub max_isomorphic_candidates: u32,
}

impl Default for RemoteGraphConfig {
    fn default() -> Self {
        let max_isomorphic_candidates = std::env::var(MAX_ISOMORPHIC_CANDIDATES_ENV)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ISOMORPHIC_CANDIDATES);

        Self {
            endpoint: String::new(),
            auth_token: None,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            max_isomorphic_candidates,
        }
    }
}

impl RemoteGraphConfig {
    /// Create a configuration for `endpoint` with default settings
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the authentication token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Set the isomorphic candidate bound.
    pub fn with_max_isomorphic_candidates(mut self, max: u32) -> Self {
        self.max_isomorphic_candidates = max;
        self
    }

    /// Check that the configuration can be used to reach an endpoint
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(RemoteError::invalid_config("missing 'endpoint'"));
        }
        if self.max_isomorphic_candidates == 0 {
            return Err(RemoteError::invalid_config(
                "'max_isomorphic_candidates' must be at least 1",
            ));
        }
        Ok(())
    }
}
