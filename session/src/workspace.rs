//! The workspace a session is bound to.

use cairn_registry::NamespaceRegistry;
use cairn_transaction::TransactionManager;

/// A session's workspace: its name, namespaces and transaction boundary.
#[derive(Debug)]
pub struct Workspace {
    name: String,
    namespaces: NamespaceRegistry,
    transactions: TransactionManager,
}

impl Workspace {
    pub(crate) fn new(
        name: impl Into<String>,
        namespaces: NamespaceRegistry,
        transactions: TransactionManager,
    ) -> Self {
        Self {
            name: name.into(),
            namespaces,
            transactions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_registry(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.transactions
    }

    /// Use this to run several saves in one application transaction.
    pub fn transaction_manager_mut(&mut self) -> &mut TransactionManager {
        &mut self.transactions
    }
}
