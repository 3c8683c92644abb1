//! In-process repository backend.
//!
//! `MemoryTransport` keeps one [`Tree`] per workspace behind a mutex and
//! implements the full [`Transport`] contract: all-or-nothing batch stores,
//! one transaction per login, path-scoped permission denials and one-shot
//! fault injection for tests.
//!
//! A login inside a transaction works on a staged copy of its workspace.
//! Its batches are kept and replayed onto the live workspace at commit, so
//! writes committed meanwhile by other logins survive.

mod tree;

pub use tree::Tree;

use crate::{
    ChangeBatch, Credentials, LoginId, NodeData, Operation, Transport, TransportError,
    TransportResult,
};
use cairn_core::names::MIX_REFERENCEABLE;
use cairn_core::{Path, Permission};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Call counters, for observing how a session drives its transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub logins: usize,
    pub logouts: usize,
    pub fetches: usize,
    pub stores: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Uncommitted work of one login.
#[derive(Debug)]
struct Staged {
    /// The workspace as the login sees it inside the transaction.
    tree: Tree,
    /// Batches stored since begin, in order.
    batches: Vec<ChangeBatch>,
}

#[derive(Debug)]
struct LoginState {
    workspace: String,
    transaction: Option<Staged>,
}

#[derive(Debug, Default)]
struct MemoryState {
    workspaces: HashMap<String, Tree>,
    logins: HashMap<LoginId, LoginState>,
    next_login: u64,
    /// Path-scoped denials; a rule covers the path and its descendants.
    denied: Vec<(Path, Permission)>,
    fail_next_store: Option<TransportError>,
    fail_next_commit: Option<TransportError>,
    fail_next_rollback: Option<TransportError>,
    stats: TransportStats,
}

impl MemoryState {
    fn permitted(&self, path: &Path, permission: Permission) -> bool {
        !self
            .denied
            .iter()
            .any(|(p, denied)| *denied == permission && (p == path || path.is_descendant_of(p)))
    }

    fn require(&self, path: &Path, permission: Permission) -> TransportResult<()> {
        if self.permitted(path, permission) {
            Ok(())
        } else {
            Err(TransportError::access_denied(format!(
                "{} not permitted at {}",
                permission, path
            )))
        }
    }

    fn workspace(&self, name: &str) -> TransportResult<&Tree> {
        self.workspaces
            .get(name)
            .ok_or_else(|| TransportError::NoSuchWorkspace {
                name: name.to_string(),
            })
    }

    fn login(&self, login: LoginId) -> TransportResult<&LoginState> {
        self.logins
            .get(&login)
            .ok_or_else(|| TransportError::unknown_login(login))
    }

    /// The tree `login` reads: its staged copy inside a transaction, the
    /// live workspace otherwise.
    fn view(&self, login: LoginId) -> TransportResult<&Tree> {
        let entry = self.login(login)?;
        match &entry.transaction {
            Some(staged) => Ok(&staged.tree),
            None => self.workspace(&entry.workspace),
        }
    }

    /// Check the write permission an operation needs.
    fn check_operation(&self, operation: &Operation) -> TransportResult<()> {
        match operation {
            Operation::AddNode { parent, .. } => self.require(parent, Permission::AddNode),
            Operation::AddMixin { path, .. } => self.require(path, Permission::SetProperty),
            Operation::SetProperty { node, .. } | Operation::RemoveProperty { node, .. } => {
                self.require(node, Permission::SetProperty)
            }
            Operation::Move {
                source,
                destination,
            } => {
                self.require(source, Permission::Remove)?;
                match destination.parent() {
                    Some(parent) => self.require(&parent, Permission::AddNode),
                    None => Ok(()),
                }
            }
            Operation::RemoveNode { path } => self.require(path, Permission::Remove),
        }
    }

    /// Apply `batch` to a copy of `tree`. Also returns the batch with any
    /// identifier the tree generated written into it, so replaying it
    /// elsewhere yields the same identifiers.
    fn apply_batch(&self, tree: &Tree, batch: &ChangeBatch) -> TransportResult<(Tree, ChangeBatch)> {
        let mut working = tree.clone();
        let mut applied = Vec::with_capacity(batch.len());
        for operation in batch.operations() {
            self.check_operation(operation)?;
            working.apply(operation).map_err(|error| {
                debug!(op = operation.kind(), %error, "batch rejected");
                error
            })?;

            let mut pinned = operation.clone();
            if let Operation::AddMixin {
                path,
                mixin,
                identifier,
            } = &mut pinned
            {
                if mixin.as_str() == MIX_REFERENCEABLE && identifier.is_none() {
                    *identifier = working.node_data(path).and_then(|data| data.identifier);
                }
            }
            applied.push(pinned);
        }
        Ok((working, ChangeBatch::new(applied)))
    }
}

/// An in-process repository reachable through the [`Transport`] contract.
#[derive(Debug)]
pub struct MemoryTransport {
    /// Accepted user/password pairs; `None` accepts every login.
    users: Option<HashMap<String, String>>,
    namespaces: Vec<(String, String)>,
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    /// A transport serving `tree` as the `default` workspace to any user.
    pub fn new(tree: Tree) -> Self {
        Self::builder().workspace("default", tree).build()
    }

    pub fn builder() -> MemoryTransportBuilder {
        MemoryTransportBuilder::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Inspection & Fault Injection ====================

    /// A copy of a workspace's committed content.
    pub fn tree(&self, workspace: &str) -> Option<Tree> {
        self.state().workspaces.get(workspace).cloned()
    }

    /// Call counters so far.
    pub fn stats(&self) -> TransportStats {
        self.state().stats
    }

    /// Number of logins not yet logged out.
    pub fn open_logins(&self) -> usize {
        self.state().logins.len()
    }

    /// Make the next `store` fail with `error` without applying anything.
    pub fn fail_next_store(&self, error: TransportError) {
        self.state().fail_next_store = Some(error);
    }

    /// Make the next `commit_transaction` fail with `error`; the
    /// transaction stays open.
    pub fn fail_next_commit(&self, error: TransportError) {
        self.state().fail_next_commit = Some(error);
    }

    /// Make the next `rollback_transaction` fail with `error`; the
    /// transaction stays open.
    pub fn fail_next_rollback(&self, error: TransportError) {
        self.state().fail_next_rollback = Some(error);
    }

    /// Deny `permission` at `path` and below.
    pub fn deny(&self, path: Path, permission: Permission) {
        self.state().denied.push((path, permission));
    }

    /// Whether any login has a transaction open.
    pub fn in_transaction(&self) -> bool {
        self.state()
            .logins
            .values()
            .any(|entry| entry.transaction.is_some())
    }
}

impl Transport for MemoryTransport {
    fn login(&self, credentials: &Credentials, workspace: &str) -> TransportResult<LoginId> {
        if let Some(users) = &self.users {
            let user = credentials.user_id().unwrap_or_default();
            let accepted = credentials
                .password()
                .is_some_and(|password| users.get(user).is_some_and(|p| p == password));
            if !accepted {
                warn!(user, "rejected login");
                return Err(TransportError::LoginFailed {
                    user: user.to_string(),
                });
            }
        }

        let mut state = self.state();
        state.workspace(workspace)?;
        state.next_login += 1;
        let login = LoginId::new(state.next_login);
        state.logins.insert(
            login,
            LoginState {
                workspace: workspace.to_string(),
                transaction: None,
            },
        );
        state.stats.logins += 1;
        debug!(%login, workspace, user = credentials.user_id(), "login");
        Ok(login)
    }

    fn logout(&self, login: LoginId) {
        let mut state = self.state();
        match state.logins.remove(&login) {
            Some(entry) => {
                if entry.transaction.is_some() {
                    debug!(%login, "discarding open transaction");
                }
                state.stats.logouts += 1;
                debug!(%login, workspace = %entry.workspace, "logout");
            }
            None => trace!(%login, "logout of unknown login"),
        }
    }

    fn namespaces(&self) -> TransportResult<Vec<(String, String)>> {
        Ok(self.namespaces.clone())
    }

    fn fetch_node(
        &self,
        login: LoginId,
        path: &Path,
        depth: usize,
    ) -> TransportResult<Vec<(Path, NodeData)>> {
        let mut state = self.state();
        state.stats.fetches += 1;
        if !state.permitted(path, Permission::Read) {
            return Err(TransportError::item_not_found(path));
        }
        let fetched = state.view(login)?.fetch(path, depth)?;
        trace!(%login, %path, depth, nodes = fetched.len(), "fetched");
        Ok(fetched
            .into_iter()
            .filter(|(p, _)| state.permitted(p, Permission::Read))
            .collect())
    }

    fn node_path_for_identifier(&self, login: LoginId, identifier: &str) -> TransportResult<Path> {
        let state = self.state();
        state
            .view(login)?
            .path_for_identifier(identifier)
            .filter(|p| state.permitted(p, Permission::Read))
            .ok_or_else(|| TransportError::IdentifierNotFound {
                identifier: identifier.to_string(),
            })
    }

    fn binary(&self, login: LoginId, path: &Path, index: usize) -> TransportResult<Vec<u8>> {
        let state = self.state();
        if !state.permitted(path, Permission::Read) {
            return Err(TransportError::item_not_found(path));
        }
        let property = state
            .view(login)?
            .property(path)
            .ok_or_else(|| TransportError::item_not_found(path))?;
        if !property.property_type.is_binary() {
            return Err(TransportError::constraint_violation(format!(
                "{} is not a binary property",
                path
            )));
        }
        property
            .values
            .get(index)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| TransportError::item_not_found(format!("{}[value {}]", path, index)))
    }

    fn permissions(&self, login: LoginId, path: &Path) -> TransportResult<Vec<Permission>> {
        let state = self.state();
        state.login(login)?;
        Ok(Permission::ALL
            .into_iter()
            .filter(|p| state.permitted(path, *p))
            .collect())
    }

    fn store(&self, login: LoginId, batch: &ChangeBatch) -> TransportResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.stats.stores += 1;
        if let Some(error) = state.fail_next_store.take() {
            warn!(%login, %error, "injected store failure");
            return Err(error);
        }

        let (working, applied) = state.apply_batch(state.view(login)?, batch)?;
        let entry = state
            .logins
            .get_mut(&login)
            .ok_or_else(|| TransportError::unknown_login(login))?;
        match &mut entry.transaction {
            Some(staged) => {
                staged.tree = working;
                staged.batches.push(applied);
                debug!(%login, operations = batch.len(), "staged change batch");
            }
            None => {
                state.workspaces.insert(entry.workspace.clone(), working);
                debug!(%login, workspace = %entry.workspace, operations = batch.len(), "stored change batch");
            }
        }
        Ok(())
    }

    fn begin_transaction(&self, login: LoginId) -> TransportResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        let entry = state
            .logins
            .get_mut(&login)
            .ok_or_else(|| TransportError::unknown_login(login))?;
        if entry.transaction.is_some() {
            return Err(TransportError::transaction("a transaction is already active"));
        }
        let tree = state
            .workspaces
            .get(&entry.workspace)
            .cloned()
            .ok_or_else(|| TransportError::NoSuchWorkspace {
                name: entry.workspace.clone(),
            })?;
        entry.transaction = Some(Staged {
            tree,
            batches: Vec::new(),
        });
        state.stats.begins += 1;
        debug!(%login, "transaction begun");
        Ok(())
    }

    fn commit_transaction(&self, login: LoginId) -> TransportResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        let entry = state.login(login)?;
        let staged = entry
            .transaction
            .as_ref()
            .ok_or_else(|| TransportError::transaction("no transaction is active"))?;
        let workspace = entry.workspace.clone();
        let batches = staged.batches.clone();

        state.stats.commits += 1;
        if let Some(error) = state.fail_next_commit.take() {
            warn!(%login, %error, "injected commit failure");
            return Err(error);
        }

        let mut live = state.workspace(&workspace)?.clone();
        for batch in &batches {
            live = state
                .apply_batch(&live, batch)
                .map_err(|error| {
                    debug!(%login, %error, "commit conflicts with the live workspace");
                    error
                })?
                .0;
        }
        state.workspaces.insert(workspace, live);
        if let Some(entry) = state.logins.get_mut(&login) {
            entry.transaction = None;
        }
        debug!(%login, batches = batches.len(), "transaction committed");
        Ok(())
    }

    fn rollback_transaction(&self, login: LoginId) -> TransportResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        let entry = state
            .logins
            .get_mut(&login)
            .ok_or_else(|| TransportError::unknown_login(login))?;
        if entry.transaction.is_none() {
            return Err(TransportError::transaction("no transaction is active"));
        }
        if let Some(error) = state.fail_next_rollback.take() {
            warn!(%login, %error, "injected rollback failure");
            return Err(error);
        }
        entry.transaction = None;
        state.stats.rollbacks += 1;
        debug!(%login, "transaction rolled back");
        Ok(())
    }
}

/// Builder for [`MemoryTransport`].
#[derive(Debug, Default)]
pub struct MemoryTransportBuilder {
    workspaces: HashMap<String, Tree>,
    users: Option<HashMap<String, String>>,
    namespaces: Vec<(String, String)>,
    denied: Vec<(Path, Permission)>,
}

impl MemoryTransportBuilder {
    /// Serve `tree` as workspace `name`.
    pub fn workspace(mut self, name: impl Into<String>, tree: Tree) -> Self {
        self.workspaces.insert(name.into(), tree);
        self
    }

    /// Accept this user/password pair. Once a user is added, every other
    /// login is rejected.
    pub fn user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.users
            .get_or_insert_with(HashMap::new)
            .insert(user.into(), password.into());
        self
    }

    /// Report an additional namespace.
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    /// Deny `permission` at `path` and below.
    pub fn deny(mut self, path: Path, permission: Permission) -> Self {
        self.denied.push((path, permission));
        self
    }

    pub fn build(self) -> MemoryTransport {
        MemoryTransport {
            users: self.users,
            namespaces: self.namespaces,
            state: Mutex::new(MemoryState {
                workspaces: self.workspaces,
                denied: self.denied,
                ..Default::default()
            }),
        }
    }
}
