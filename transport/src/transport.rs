//! The transport contract.

use std::fmt;

use crate::{ChangeBatch, Credentials, NodeData, TransportResult};
use cairn_core::{Path, Permission};

/// Handle of one login, issued by [`Transport::login`].
///
/// Every later call names the login it acts for, so the transport can keep
/// per-login state such as an open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoginId(u64);

impl LoginId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login-{}", self.0)
    }
}

/// Access to a remote repository.
///
/// A transport is shared by every session of a repository. Each session
/// logs in once and passes its [`LoginId`] with every call; the login fixes
/// the workspace. Transactions belong to a login, and a login inside a
/// transaction reads its own uncommitted writes. Implementations must be
/// safe to call from several threads.
pub trait Transport: Send + Sync {
    /// Authenticate and check that the workspace exists.
    fn login(&self, credentials: &Credentials, workspace: &str) -> TransportResult<LoginId>;

    /// Release whatever the login acquired, discarding an open transaction.
    fn logout(&self, login: LoginId);

    /// Namespaces registered in the repository, as (prefix, uri) pairs.
    fn namespaces(&self) -> TransportResult<Vec<(String, String)>>;

    /// Fetch the node at `path` plus its descendants up to `depth` levels
    /// below it, parents before children. The first entry is the node itself.
    fn fetch_node(
        &self,
        login: LoginId,
        path: &Path,
        depth: usize,
    ) -> TransportResult<Vec<(Path, NodeData)>>;

    /// Resolve an identifier to the node's current path.
    fn node_path_for_identifier(&self, login: LoginId, identifier: &str) -> TransportResult<Path>;

    /// Read the bytes of value `index` of the binary property at `path`.
    fn binary(&self, login: LoginId, path: &Path, index: usize) -> TransportResult<Vec<u8>>;

    /// The actions the login may perform at `path`.
    fn permissions(&self, login: LoginId, path: &Path) -> TransportResult<Vec<Permission>>;

    /// Apply a change batch: either every operation is applied or none is.
    /// Inside a transaction the batch becomes visible to other logins only
    /// when the transaction commits.
    fn store(&self, login: LoginId, batch: &ChangeBatch) -> TransportResult<()>;

    fn begin_transaction(&self, login: LoginId) -> TransportResult<()>;

    fn commit_transaction(&self, login: LoginId) -> TransportResult<()>;

    fn rollback_transaction(&self, login: LoginId) -> TransportResult<()>;
}
