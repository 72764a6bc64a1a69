//! Unified error types and result handling.
//!
//! Every failure maps onto an [`ErrorKind`] tag so callers can render a message
//! for the user without inspecting individual variants.

use thiserror::Error;

/// Broad classification of a failure, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input was malformed; the user can correct it and resubmit.
    Validation,
    /// The referenced record does not exist or belongs to someone else.
    NotFound,
    /// A multi-row write could not complete and was rolled back.
    Transaction,
    /// Configuration, I/O or storage failures outside a transaction.
    Internal,
}

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A recurrence descriptor is malformed
    #[error("Invalid recurrence: {message}")]
    InvalidRecurrence {
        /// Which rule was broken
        message: String,
    },

    /// A monetary amount (in cents) was rejected
    #[error("Invalid amount: {amount} cents")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Any other field-level validation failure
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule was broken
        message: String,
    },

    /// Category does not exist or is not visible to the caller
    #[error("Budget category not found: {id}")]
    CategoryNotFound {
        /// Requested category id
        id: i64,
    },

    /// Item does not exist or is not visible to the caller
    #[error("Budget item not found: {id}")]
    ItemNotFound {
        /// Requested item id
        id: i64,
    },

    /// A record exists but sits outside the sibling scope of the operation
    #[error("Record {id} is outside the scope of this operation")]
    OutOfScope {
        /// Offending record id
        id: i64,
    },

    /// A multi-row write failed and was rolled back
    #[error("Transaction '{operation}' failed and was rolled back: {source}")]
    Transaction {
        /// Name of the operation that was running
        operation: &'static str,
        /// Underlying database error
        source: sea_orm::DbErr,
    },

    /// Database error outside of a transactional operation
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Returns the tag used to surface this failure to callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRecurrence { .. } | Self::InvalidAmount { .. } | Self::Validation { .. } => {
                ErrorKind::Validation
            }
            Self::CategoryNotFound { .. } | Self::ItemNotFound { .. } | Self::OutOfScope { .. } => {
                ErrorKind::NotFound
            }
            Self::Transaction { .. } => ErrorKind::Transaction,
            Self::Config { .. } | Self::Database(_) | Self::EnvVar(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Re-tags a database failure raised while `operation` held a transaction.
    #[must_use]
    pub fn in_transaction(self, operation: &'static str) -> Self {
        match self {
            Self::Database(source) => Self::Transaction { operation, source },
            other => other,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn recurrence(message: impl Into<String>) -> Self {
        Self::InvalidRecurrence {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
