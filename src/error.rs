//! Errors raised by resource code.
//!
//! Predicates, actions and renderers return [`ResourceError`]; the decision
//! engine turns any of them into a 500 outcome without exposing the message.

use thiserror::Error;

use crate::store::StoreError;

/// Failure inside a descriptor-supplied function.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The store rejected or could not complete a transaction.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required context was missing or had the wrong shape.
    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("{0}")]
    Internal(String),
}

/// Result alias for descriptor functions.
pub type ResourceResult<T> = Result<T, ResourceError>;
