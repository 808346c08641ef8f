//! Query error types
//!
//! Compilation errors abort before anything is sent to the store; execution
//! errors abort the whole query on the first failing sub-query.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while compiling a descriptor into a plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// A dimension declared a datatype the planner does not know
    #[error("Dimension [{key}] has unknown type of [{datatype}]")]
    UnknownDimensionType { key: String, datatype: String },

    /// The match clause could not be serialized for keying
    #[error("Failed to serialize match clause: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query plan compilation failed
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// A sub-query failed against the store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The provider has no open connection
    #[error("No connection to the store")]
    NotConnected,

    /// A sub-query task could not be joined
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
