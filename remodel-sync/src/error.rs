//! Error types for the resolution engine.

use crate::envelope;
use remodel_links::LinkError;
use remodel_model::{HttpMethod, ModelError};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for engine operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A failed REST exchange with an entity's own service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("{method} {url} failed: {reason}")]
    Network {
        method: HttpMethod,
        url: String,
        reason: String,
    },

    /// The service answered with a non-success status.
    #[error("{method} {url} returned status {status}")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
        body: Value,
    },
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// REST transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A relation declaration or resolution request is unusable.
    #[error("cannot resolve relation: {0}")]
    Resolution(String),

    /// Link-service failure.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Entity type or model failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// One or more related entities could not be deleted.
    #[error("failed to delete {} related entities", .failures.len())]
    RelationDelete { failures: Vec<RelationFailure> },

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RemoteError {
    /// Error entries the remote service reported in its response body.
    pub fn error_entries(&self) -> Vec<Value> {
        match self {
            RemoteError::Transport(TransportError::Status { body, .. }) => {
                envelope::error_entries(body)
            }
            _ => Vec::new(),
        }
    }

    /// HTTP status of a transport failure, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// One failed member of a relation fan-out.
///
/// Fetch and save fan-outs record these under the owning model's `errors`
/// attribute instead of failing the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationFailure {
    /// Plural name of the related type.
    pub relation: String,
    /// Id of the related entity, when known.
    pub id: Option<String>,
    pub message: String,
    /// Entries the service reported under `data.errors`.
    #[serde(skip)]
    pub details: Vec<Value>,
}

impl RelationFailure {
    pub fn new(relation: impl Into<String>, id: Option<String>, error: &RemoteError) -> Self {
        Self {
            relation: relation.into(),
            id,
            message: error.to_string(),
            details: error.error_entries(),
        }
    }

    /// Entries to append to a model's `errors` attribute.
    ///
    /// The service's own error entries when it sent any, otherwise one
    /// entry describing the failure.
    pub fn into_entries(self) -> Vec<Value> {
        if !self.details.is_empty() {
            return self.details;
        }
        vec![json!({
            "relation": self.relation,
            "id": self.id,
            "message": self.message,
        })]
    }
}
