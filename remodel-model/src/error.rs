//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by entity types and models.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The entity type has no base URI, so no requests can be made for it.
    #[error("no base URI specified for entity type {0}")]
    MissingBaseUri(String),

    /// The entity type declaration is unusable.
    #[error("invalid entity type {name}: {reason}")]
    InvalidEntityType { name: String, reason: String },

    /// An HTTP method string could not be parsed.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}
