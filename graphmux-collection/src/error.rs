//! Error types for the collection crate

use thiserror::Error;

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors that can occur in collection operations
#[derive(Error, Debug)]
pub enum CollectionError {
    /// The collection does not support the operation (e.g. mutating an
    /// immutable collection)
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A blank node argument was not minted by this collection
    #[error("Blank node does not belong to this collection")]
    AlienNode,

    /// Write lock requested by a thread holding only the read lock
    #[error("Cannot upgrade a read lock to a write lock")]
    LockUpgrade,

    /// Operation called in a state where it is not valid
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Error raised by the storage backend
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CollectionError {
    /// Create an unsupported operation error
    pub fn unsupported(op: impl Into<String>) -> Self {
        Self::Unsupported(op.into())
    }

    /// Create an illegal state error
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// Wrap a backend error
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    /// Check if this is an unsupported operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
