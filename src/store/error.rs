//! Store error types

use thiserror::Error;

/// Errors raised by the time-series store client
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Store could not be reached
    #[error("Store unavailable")]
    Unavailable,

    /// Non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The store rejected a statement
    #[error("Statement failed: {0}")]
    Statement(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A document could not be turned into a point
    #[error("Invalid point: {0}")]
    InvalidPoint(String),
}

impl StoreError {
    /// Classify a transport error
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else if e.is_connect() {
            StoreError::Unavailable
        } else {
            StoreError::Request(e)
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
