//! Error types for the remote SPARQL adapter

use graphmux_collection::CollectionError;
use graphmux_federation::FederationError;
use thiserror::Error;

/// Result type for remote SPARQL operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors that can occur talking to a SPARQL endpoint
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection failure, timeout, or other transport fault
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("Endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response is not a well-formed SPARQL results document
    #[error("Malformed SPARQL response: {0}")]
    MalformedResponse(String),

    /// JSON results document failed to deserialize
    #[error("Invalid SPARQL results JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// XML results document failed to parse
    #[error("Invalid SPARQL results XML: {0}")]
    Xml(String),

    /// Adapter configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RemoteError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<quick_xml::Error> for RemoteError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<RemoteError> for CollectionError {
    fn from(err: RemoteError) -> Self {
        CollectionError::backend(err)
    }
}

impl From<RemoteError> for FederationError {
    fn from(err: RemoteError) -> Self {
        FederationError::backend(err.to_string())
    }
}
