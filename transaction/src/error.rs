//! Transaction error types.

use cairn_transport::TransportError;
use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// No transaction is active.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// Transaction is already active.
    #[error("transaction already active")]
    AlreadyActive,

    /// The remote side refused a transaction call.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
