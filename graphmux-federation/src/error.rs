//! Error types for the provider federation

use graphmux_collection::CollectionError;
use graphmux_graph_ir::Iri;
use thiserror::Error;

/// Result type for federation and provider operations
pub type Result<T> = std::result::Result<T, FederationError>;

/// Errors raised by providers and the federation
#[derive(Error, Debug)]
pub enum FederationError {
    /// No provider serves the named graph
    #[error("No such graph: {0}")]
    NoSuchEntity(Iri),

    /// Creation collides with an existing graph
    #[error("Graph already exists: {0}")]
    EntityAlreadyExists(Iri),

    /// A provider refuses to delete an existing graph
    #[error("Graph cannot be deleted: {0}")]
    EntityUndeletable(Iri),

    /// Provider lacks the capability
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Argument the provider cannot handle (e.g. a name outside its scheme)
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// Blank node that the receiving backend never minted
    #[error("Blank node does not belong to this graph")]
    AlienNode,

    /// No fastlane target and no generic query engine configured
    #[error("No query engine available")]
    NoQueryEngine,

    /// Federation is not active
    #[error("Federation is not active")]
    NotActive,

    /// Query text could not be scanned for graph references
    #[error("Query parse error: {0}")]
    QueryParse(String),

    /// Collection-level failure
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Backend fault (I/O, transport, malformed response)
    #[error("Backend error: {0}")]
    Backend(String),
}

/// How the federation treats a provider's failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Provider declined; ask the next one
    TryNext,
    /// Genuine fault; propagate to the caller
    Fatal,
}

impl FederationError {
    /// Create a no such entity error
    pub fn no_such_entity(name: impl Into<Iri>) -> Self {
        Self::NoSuchEntity(name.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(op: impl Into<String>) -> Self {
        Self::Unsupported(op.into())
    }

    /// Create an illegal argument error
    pub fn illegal_argument(msg: impl Into<String>) -> Self {
        Self::IllegalArgument(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Classify this error for provider fallback
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::NoSuchEntity(_) | Self::IllegalArgument(_) | Self::Unsupported(_) => {
                Disposition::TryNext
            }
            Self::Collection(CollectionError::Unsupported(_)) => Disposition::TryNext,
            _ => Disposition::Fatal,
        }
    }
}
