//! Error types for link-service access.

use thiserror::Error;

/// Result type for link-service operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors returned by the link-service or the channel to it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The service could not be reached.
    #[error("link service unavailable at {address}: {reason}")]
    Unavailable { address: String, reason: String },

    /// The service rejected the request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The link to update or delete does not exist.
    #[error("link not found: {0}")]
    NotFound(String),

    /// The RPC did not finish within its deadline.
    #[error("deadline of {deadline_ms}ms exceeded calling {method}")]
    DeadlineExceeded { method: String, deadline_ms: u64 },

    /// The link stream failed part way.
    #[error("link stream error: {0}")]
    Stream(String),

    /// Unknown time unit for a deadline.
    #[error("invalid timeout unit specified: {0}")]
    InvalidTimeUnit(String),
}
