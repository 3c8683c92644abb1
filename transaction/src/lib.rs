//! Cairn Transaction
//!
//! Repository transactions driven over the transport.
//!
//! Responsibilities:
//! - Track whether an application transaction is open
//! - Implement BEGIN/COMMIT/ROLLBACK against the transport primitives
//! - Keep the local state consistent when the remote side fails

mod error;
mod manager;

pub use error::{TransactionError, TransactionResult};
pub use manager::{TransactionManager, TransactionState};
