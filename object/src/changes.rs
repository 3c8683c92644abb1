//! Change log for tracking pending changes.

use cairn_transport::{ChangeBatch, Operation};

/// Ordered log of changes not yet committed.
///
/// Operations are kept in the order they were made; each names paths as
/// they were in the session's view at that moment, so replaying the log in
/// order against the remote state reproduces the local view.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    operations: Vec<Operation>,
}

impl ChangeLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn record(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Recorded operations, oldest first.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Check if anything is pending.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// The batch to send to the remote repository.
    pub fn to_batch(&self) -> ChangeBatch {
        ChangeBatch::new(self.operations.clone())
    }

    /// Discard all recorded operations.
    pub fn clear(&mut self) {
        self.operations.clear();
    }
}
