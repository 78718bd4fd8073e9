//! Store error definitions.

use thiserror::Error;

/// Errors raised by store transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No entry was ever stored under this id.
    #[error("entry {0} not found")]
    NotFound(String),

    /// The entry existed and has been deleted.
    #[error("entry {0} has been deleted")]
    Gone(String),

    /// The entry moved past the version a conditional write was checked against.
    #[error("entry {id} changed: expected version {expected}, found {found:?}")]
    Stale {
        id: String,
        expected: u64,
        found: Option<u64>,
    },

    /// A transform refused to produce a new value.
    #[error("update rejected: {0}")]
    Rejected(String),

    /// A slot lock was poisoned by a panicking transaction.
    #[error("store slot {0} is poisoned")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
