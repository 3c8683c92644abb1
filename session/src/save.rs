//! Committing a session's pending changes.
//!
//! A save outside an application transaction wraps the remote write in an
//! implicit transaction of its own, so a failure leaves the repository as it
//! was. Inside an application transaction the save joins it and leaves
//! commit or rollback to the application.
//!
//! Only the save that began the implicit transaction finishes it. If its
//! rollback fails the transaction is abandoned rather than left looking like
//! an application transaction that the next save would join.

use cairn_object::ObjectManager;
use cairn_transaction::TransactionManager;
use tracing::{debug, warn};

use crate::{SessionError, SessionResult};

/// How a save ended.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Nothing was pending.
    Unchanged,
    /// The changes were written inside the application's transaction.
    Joined,
    /// The changes were written and the implicit transaction committed.
    Committed,
    /// The implicit transaction was rolled back after this error.
    RolledBack(SessionError),
    /// The write failed inside the application's transaction, which is
    /// left open.
    Failed(SessionError),
}

impl SaveOutcome {
    /// Whether the changes reached the repository.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Unchanged | Self::Joined | Self::Committed)
    }

    /// The error of a failed save.
    pub fn into_result(self) -> SessionResult<()> {
        match self {
            Self::Unchanged | Self::Joined | Self::Committed => Ok(()),
            Self::RolledBack(e) | Self::Failed(e) => Err(e),
        }
    }
}

/// Write the pending changes of `objects`.
///
/// The pending changes survive every failed outcome unchanged.
pub(crate) fn save(objects: &mut ObjectManager, transactions: &mut TransactionManager) -> SaveOutcome {
    if !objects.has_pending_changes() {
        return SaveOutcome::Unchanged;
    }

    let implicit = !transactions.in_transaction();
    if implicit {
        if let Err(e) = transactions.begin() {
            return SaveOutcome::Failed(e.into());
        }
    }

    if let Err(e) = objects.store_pending() {
        let error = SessionError::from(e);
        return if implicit {
            roll_back(transactions, error)
        } else {
            SaveOutcome::Failed(error)
        };
    }

    if !implicit {
        objects.complete_commit();
        return SaveOutcome::Joined;
    }

    match transactions.commit() {
        Ok(()) => {
            objects.complete_commit();
            SaveOutcome::Committed
        }
        Err(e) => roll_back(transactions, e.into()),
    }
}

fn roll_back(transactions: &mut TransactionManager, error: SessionError) -> SaveOutcome {
    debug!(%error, "rolling back implicit transaction");
    if let Err(rollback_error) = transactions.rollback() {
        warn!(%rollback_error, "rollback after failed save failed");
        transactions.abandon();
    }
    SaveOutcome::RolledBack(error)
}
