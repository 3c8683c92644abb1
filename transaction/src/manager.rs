//! Transaction manager over the repository transport.

use std::sync::Arc;

use cairn_transport::{LoginId, Transport};
use tracing::{debug, warn};

use crate::error::{TransactionError, TransactionResult};

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction is active.
    Inactive,
    /// Transaction is active.
    Active,
    /// Transaction is being committed.
    Committing,
    /// Transaction is being rolled back.
    RollingBack,
}

/// Transaction manager for one workspace login.
///
/// The manager only tracks the boundary; the changes made inside a
/// transaction live on the remote side, scoped to the login, until it
/// commits or rolls back. A failed remote commit or rollback leaves the
/// transaction active so the caller can decide how to finish it, including
/// giving up on it with [`abandon`](Self::abandon).
pub struct TransactionManager {
    transport: Arc<dyn Transport>,
    login: LoginId,
    state: TransactionState,
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("login", &self.login)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TransactionManager {
    /// Create a new transaction manager for `login`.
    pub fn new(transport: Arc<dyn Transport>, login: LoginId) -> Self {
        Self {
            transport,
            login,
            state: TransactionState::Inactive,
        }
    }

    /// Check if a transaction is active.
    pub fn in_transaction(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Get the current transaction state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    // ==================== Transaction Lifecycle ====================

    /// Begin a new transaction.
    pub fn begin(&mut self) -> TransactionResult<()> {
        if self.state != TransactionState::Inactive {
            return Err(TransactionError::AlreadyActive);
        }

        self.transport.begin_transaction(self.login)?;
        self.state = TransactionState::Active;
        debug!("transaction begun");

        Ok(())
    }

    /// Commit the current transaction.
    pub fn commit(&mut self) -> TransactionResult<()> {
        if self.state != TransactionState::Active {
            return Err(TransactionError::NoActiveTransaction);
        }

        self.state = TransactionState::Committing;
        if let Err(e) = self.transport.commit_transaction(self.login) {
            self.state = TransactionState::Active;
            return Err(e.into());
        }
        self.state = TransactionState::Inactive;
        debug!("transaction committed");

        Ok(())
    }

    /// Rollback the current transaction.
    pub fn rollback(&mut self) -> TransactionResult<()> {
        if self.state != TransactionState::Active {
            return Err(TransactionError::NoActiveTransaction);
        }

        self.state = TransactionState::RollingBack;
        if let Err(e) = self.transport.rollback_transaction(self.login) {
            self.state = TransactionState::Active;
            return Err(e.into());
        }
        self.state = TransactionState::Inactive;
        debug!("transaction rolled back");

        Ok(())
    }

    /// Stop tracking the current transaction without finishing it.
    ///
    /// For when neither commit nor rollback went through. Whatever the
    /// remote side still holds is released at logout at the latest; a later
    /// [`begin`](Self::begin) reports it if it is still open.
    pub fn abandon(&mut self) {
        if self.state == TransactionState::Inactive {
            return;
        }
        warn!(login = %self.login, state = ?self.state, "abandoning transaction");
        self.state = TransactionState::Inactive;
    }
}
