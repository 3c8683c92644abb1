//! Session: one login to one workspace.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use cairn_core::names::NT_UNSTRUCTURED;
use cairn_core::{Item, Node, Path, Permission, Property, PropertyData};
use cairn_export::{export_document_view, export_system_view, ExportOptions};
use cairn_object::ObjectManager;
use cairn_registry::NamespaceRegistry;
use cairn_transaction::TransactionManager;
use cairn_transport::{Credentials, Transport};
use tracing::{debug, warn};

use crate::export::SessionSource;
use crate::save::{self, SaveOutcome};
use crate::{
    LazyBinary, Repository, RepositoryConfig, SessionError, SessionKey, SessionOption,
    SessionResult, Workspace,
};

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    /// Turn `PathNotFound` into `Missing`; other errors stay errors.
    fn from_result(result: SessionResult<T>) -> SessionResult<Self> {
        match result {
            Ok(value) => Ok(Lookup::Found(value)),
            Err(SessionError::PathNotFound { .. }) => Ok(Lookup::Missing),
            Err(e) => Err(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

/// Access control management. No repository reachable through this client
/// offers it, so no value of this type exists.
#[derive(Debug)]
pub enum AccessControlManager {}

/// Retention and hold management. Not offered; no value of this type
/// exists.
#[derive(Debug)]
pub enum RetentionManager {}

/// How `import_xml` treats identifiers that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportUuidBehavior {
    CreateNew,
    RemoveExisting,
    ReplaceExisting,
    Throw,
}

/// A login to one workspace of a repository.
///
/// Lookups see the saved state plus this session's pending changes.
/// Mutations stay local until [`save`](Self::save). After
/// [`logout`](Self::logout) every operation fails with
/// [`SessionError::NotLive`].
pub struct Session {
    key: SessionKey,
    repository: Repository,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    workspace: Workspace,
    objects: ObjectManager,
    live: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("workspace", &self.workspace.name())
            .field("user_id", &self.credentials.user_id())
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Log in to `workspace` and register the session with the repository.
    pub fn new(
        repository: &Repository,
        workspace: &str,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> SessionResult<Self> {
        let login = transport.login(&credentials, workspace)?;

        let config = repository.config();
        let namespaces = match Self::namespace_registry(config, transport.as_ref()) {
            Ok(namespaces) => namespaces,
            Err(e) => {
                warn!(%login, error = %e, "namespace setup failed, logging out");
                transport.logout(login);
                return Err(e);
            }
        };

        let mut objects = ObjectManager::new(transport.clone(), login, workspace);
        objects.set_fetch_depth(config.fetch_depth);
        let transactions = TransactionManager::new(transport.clone(), login);
        let key = repository.sessions().register(
            workspace,
            credentials.user_id().map(str::to_string),
            login,
            transport.clone(),
        );
        debug!(%key, %login, workspace, user = credentials.user_id(), "logged in");

        Ok(Self {
            key,
            repository: repository.clone(),
            credentials,
            transport,
            workspace: Workspace::new(workspace, namespaces, transactions),
            objects,
            live: true,
        })
    }

    /// Configured namespaces first, then the ones the repository reports.
    fn namespace_registry(
        config: &RepositoryConfig,
        transport: &dyn Transport,
    ) -> SessionResult<NamespaceRegistry> {
        let mut namespaces = NamespaceRegistry::builder();
        for (prefix, uri) in &config.namespaces {
            namespaces.register(prefix.as_str(), uri.as_str())?;
        }
        for (prefix, uri) in transport.namespaces()? {
            namespaces.register(prefix, uri)?;
        }
        Ok(namespaces.build())
    }

    // ==================== Lifecycle ====================

    /// Whether the session can still be used.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// End the session. Pending changes are discarded.
    pub fn logout(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if self.objects.has_pending_changes() {
            warn!(key = %self.key, "logging out with unsaved changes");
        }
        self.objects.clear();
        self.repository.sessions().unregister(self.key);
        self.transport.logout(self.objects.login());
        debug!(key = %self.key, "logged out");
    }

    fn ensure_live(&self) -> SessionResult<()> {
        if self.live {
            Ok(())
        } else {
            Err(SessionError::NotLive)
        }
    }

    /// The key this session is registered under.
    pub fn key(&self) -> SessionResult<SessionKey> {
        self.ensure_live()?;
        Ok(self.key)
    }

    pub fn repository(&self) -> SessionResult<&Repository> {
        self.ensure_live()?;
        Ok(&self.repository)
    }

    pub fn user_id(&self) -> SessionResult<Option<&str>> {
        self.ensure_live()?;
        Ok(self.credentials.user_id())
    }

    /// Names of the attributes passed with the credentials, sorted.
    pub fn attribute_names(&self) -> SessionResult<Vec<&str>> {
        self.ensure_live()?;
        Ok(self.credentials.attribute_names())
    }

    pub fn attribute(&self, name: &str) -> SessionResult<Option<&str>> {
        self.ensure_live()?;
        Ok(self.credentials.attribute(name))
    }

    pub fn workspace(&self) -> SessionResult<&Workspace> {
        self.ensure_live()?;
        Ok(&self.workspace)
    }

    pub fn workspace_mut(&mut self) -> SessionResult<&mut Workspace> {
        self.ensure_live()?;
        Ok(&mut self.workspace)
    }

    // ==================== Resolution ====================

    fn parse_path(path: &str) -> SessionResult<Path> {
        Ok(Path::parse(path)?)
    }

    /// Whether the last segment is written with an index, as in `name[1]`.
    /// Such a path never names a property.
    fn names_indexed_segment(path: &str) -> bool {
        path.rsplit('/').next().is_some_and(|last| last.ends_with(']'))
    }

    /// The node or, failing that, the property at `path`.
    pub fn item(&mut self, text: &str) -> SessionResult<Item> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        if let Lookup::Found(node) = self.lookup_node_at(&path)? {
            return Ok(Item::Node(node));
        }
        match self.lookup_property_at(&path, Self::names_indexed_segment(text))? {
            Lookup::Found(property) => Ok(Item::Property(property)),
            Lookup::Missing => Err(SessionError::path_not_found(&path)),
        }
    }

    pub fn node(&mut self, path: &str) -> SessionResult<Node> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        Ok(self.objects.node(&path)?)
    }

    pub fn root_node(&mut self) -> SessionResult<Node> {
        self.ensure_live()?;
        Ok(self.objects.node(&Path::root())?)
    }

    pub fn node_by_identifier(&mut self, identifier: &str) -> SessionResult<Node> {
        self.ensure_live()?;
        Ok(self.objects.node_by_identifier(identifier)?)
    }

    /// The property at `path`. A last segment written with an index, even
    /// `[1]`, is not found.
    pub fn property(&mut self, text: &str) -> SessionResult<Property> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        if Self::names_indexed_segment(text) {
            return Err(SessionError::path_not_found(text));
        }
        Ok(self.objects.property(&path)?)
    }

    /// Nodes at `paths` in request order; paths that do not resolve are
    /// left out.
    pub fn nodes(&mut self, paths: &[&str]) -> SessionResult<Vec<Node>> {
        self.ensure_live()?;
        let paths = paths
            .iter()
            .map(|p| Self::parse_path(p))
            .collect::<SessionResult<Vec<_>>>()?;
        Ok(self.objects.nodes(&paths)?)
    }

    /// Nodes keyed by identifier; identifiers that do not resolve are left
    /// out.
    pub fn nodes_by_identifier(&mut self, identifiers: &[&str]) -> SessionResult<BTreeMap<String, Node>> {
        self.ensure_live()?;
        let nodes = self.objects.nodes_by_identifier(identifiers)?;
        Ok(nodes
            .into_iter()
            .filter_map(|node| node.identifier().map(str::to_string).map(|id| (id, node)))
            .collect())
    }

    /// Properties at `paths` in request order; paths that do not resolve
    /// are left out.
    pub fn properties(&mut self, paths: &[&str]) -> SessionResult<Vec<Property>> {
        self.ensure_live()?;
        let mut found = Vec::with_capacity(paths.len());
        for text in paths {
            let path = Self::parse_path(text)?;
            match self.lookup_property_at(&path, Self::names_indexed_segment(text))? {
                Lookup::Found(property) => found.push(property),
                Lookup::Missing => debug!(%path, "dropping unresolvable property path"),
            }
        }
        Ok(found)
    }

    fn lookup_node_at(&mut self, path: &Path) -> SessionResult<Lookup<Node>> {
        Lookup::from_result(self.objects.node(path).map_err(SessionError::from))
    }

    fn lookup_property_at(&mut self, path: &Path, indexed: bool) -> SessionResult<Lookup<Property>> {
        if indexed {
            return Ok(Lookup::Missing);
        }
        Lookup::from_result(self.objects.property(path).map_err(SessionError::from))
    }

    pub fn lookup_node(&mut self, path: &str) -> SessionResult<Lookup<Node>> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        self.lookup_node_at(&path)
    }

    pub fn lookup_property(&mut self, text: &str) -> SessionResult<Lookup<Property>> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        self.lookup_property_at(&path, Self::names_indexed_segment(text))
    }

    pub fn node_exists(&mut self, path: &str) -> SessionResult<bool> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        if path.is_root() {
            return Ok(true);
        }
        Ok(self.lookup_node_at(&path)?.is_found())
    }

    pub fn property_exists(&mut self, text: &str) -> SessionResult<bool> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        Ok(self
            .lookup_property_at(&path, Self::names_indexed_segment(text))?
            .is_found())
    }

    pub fn item_exists(&mut self, text: &str) -> SessionResult<bool> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        self.item_exists_at(&path, Self::names_indexed_segment(text))
    }

    fn item_exists_at(&mut self, path: &Path, indexed: bool) -> SessionResult<bool> {
        if path.is_root() || self.lookup_node_at(path)?.is_found() {
            return Ok(true);
        }
        Ok(self.lookup_property_at(path, indexed)?.is_found())
    }

    // ==================== Mutations ====================

    /// Move the node at `source` to `destination`.
    ///
    /// Fails with `ItemExists` if any item exists at `destination`, even
    /// where a same-name sibling would be allowed.
    pub fn move_item(&mut self, source: &str, destination: &str) -> SessionResult<()> {
        self.ensure_live()?;
        let indexed = Self::names_indexed_segment(destination);
        let source = Self::parse_path(source)?;
        let destination = Self::parse_path(destination)?;
        if self.item_exists_at(&destination, indexed)? {
            return Err(SessionError::item_exists(&destination));
        }
        Ok(self.objects.move_node(&source, &destination)?)
    }

    /// Remove the node or property at `path`.
    pub fn remove_item(&mut self, text: &str) -> SessionResult<()> {
        self.ensure_live()?;
        let path = Self::parse_path(text)?;
        if self.lookup_node_at(&path)?.is_found() {
            return Ok(self.objects.remove_node(&path)?);
        }
        if self
            .lookup_property_at(&path, Self::names_indexed_segment(text))?
            .is_found()
        {
            return Ok(self.objects.remove_property(&path)?);
        }
        Err(SessionError::path_not_found(&path))
    }

    /// Add a child node, `nt:unstructured` unless a type is given.
    pub fn add_node(
        &mut self,
        parent: &str,
        name: &str,
        primary_type: Option<&str>,
    ) -> SessionResult<Node> {
        self.ensure_live()?;
        let parent = Self::parse_path(parent)?;
        let path = self
            .objects
            .add_node(&parent, name, primary_type.unwrap_or(NT_UNSTRUCTURED))?;
        Ok(self.objects.node(&path)?)
    }

    pub fn add_mixin(&mut self, path: &str, mixin: &str) -> SessionResult<()> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        Ok(self.objects.add_mixin(&path, mixin)?)
    }

    /// Set a property on the node at `node_path`.
    pub fn set_property(&mut self, node_path: &str, property: PropertyData) -> SessionResult<Property> {
        self.ensure_live()?;
        let node_path = Self::parse_path(node_path)?;
        let property_path = node_path.child(&property.name, 1)?;
        self.objects.set_property(&node_path, property)?;
        Ok(self.objects.property(&property_path)?)
    }

    pub fn has_pending_changes(&self) -> SessionResult<bool> {
        self.ensure_live()?;
        Ok(self.objects.has_pending_changes())
    }

    /// Write all pending changes as one unit.
    pub fn save(&mut self) -> SessionResult<()> {
        self.save_with_outcome()?.into_result()
    }

    /// Like [`save`](Self::save), reporting how the transaction ended.
    pub fn save_with_outcome(&mut self) -> SessionResult<SaveOutcome> {
        self.ensure_live()?;
        let outcome = save::save(&mut self.objects, self.workspace.transaction_manager_mut());
        match &outcome {
            SaveOutcome::Unchanged => debug!(key = %self.key, "nothing to save"),
            SaveOutcome::Joined => debug!(key = %self.key, "saved within application transaction"),
            SaveOutcome::Committed => debug!(key = %self.key, "saved"),
            SaveOutcome::RolledBack(error) => warn!(key = %self.key, %error, "save rolled back"),
            SaveOutcome::Failed(error) => warn!(key = %self.key, %error, "save failed"),
        }
        Ok(outcome)
    }

    // ==================== Export ====================

    /// Write the system view of the subtree at `path`.
    pub fn export_system_view<W: Write>(
        &mut self,
        path: &str,
        out: &mut W,
        skip_binary: bool,
        no_recurse: bool,
    ) -> SessionResult<()> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        let root = self.objects.node(&path)?;
        let mut source = SessionSource::new(&mut self.objects);
        export_system_view(
            &root,
            self.workspace.namespace_registry(),
            &mut source,
            ExportOptions::new(skip_binary, no_recurse),
            out,
        )?;
        Ok(())
    }

    /// Write the document view of the subtree at `path`.
    pub fn export_document_view<W: Write>(
        &mut self,
        path: &str,
        out: &mut W,
        skip_binary: bool,
        no_recurse: bool,
    ) -> SessionResult<()> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        let root = self.objects.node(&path)?;
        let mut source = SessionSource::new(&mut self.objects);
        export_document_view(
            &root,
            self.workspace.namespace_registry(),
            &mut source,
            ExportOptions::new(skip_binary, no_recurse),
            out,
        )?;
        Ok(())
    }

    // ==================== Permissions ====================

    /// Whether every action in the comma-separated `actions` list is
    /// granted at `path`. The path need not exist.
    pub fn has_permission(&mut self, path: &str, actions: &str) -> SessionResult<bool> {
        self.ensure_live()?;
        let path = Self::parse_path(path)?;
        let requested = Permission::parse_list(actions)
            .map_err(|action| SessionError::invalid_argument(format!("unknown action '{}'", action)))?;
        let granted = self.objects.permissions(&path)?;
        Ok(requested.iter().all(|action| granted.contains(action)))
    }

    /// Like [`has_permission`](Self::has_permission), failing with
    /// `AccessDenied` instead of returning `false`.
    pub fn check_permission(&mut self, path: &str, actions: &str) -> SessionResult<()> {
        if self.has_permission(path, actions)? {
            Ok(())
        } else {
            Err(SessionError::access_denied(format!(
                "'{}' not granted at {}",
                actions, path
            )))
        }
    }

    // ==================== Namespaces ====================

    pub fn namespace_prefixes(&self) -> SessionResult<Vec<&str>> {
        self.ensure_live()?;
        Ok(self.workspace.namespace_registry().prefixes())
    }

    pub fn namespace_uri(&self, prefix: &str) -> SessionResult<&str> {
        self.ensure_live()?;
        Ok(self.workspace.namespace_registry().uri(prefix)?)
    }

    pub fn namespace_prefix(&self, uri: &str) -> SessionResult<&str> {
        self.ensure_live()?;
        Ok(self.workspace.namespace_registry().prefix(uri)?)
    }

    /// Session-local namespace remapping.
    pub fn set_namespace_prefix(&mut self, _prefix: &str, _uri: &str) -> SessionResult<()> {
        self.ensure_live()?;
        Err(SessionError::NotImplemented {
            operation: "set_namespace_prefix",
        })
    }

    // ==================== Options ====================

    pub fn set_session_option(&mut self, option: SessionOption, value: usize) -> SessionResult<()> {
        self.ensure_live()?;
        match option {
            SessionOption::FetchDepth => self.objects.set_fetch_depth(value),
        }
        Ok(())
    }

    pub fn session_option(&self, option: SessionOption) -> SessionResult<usize> {
        self.ensure_live()?;
        Ok(match option {
            SessionOption::FetchDepth => self.objects.fetch_depth(),
        })
    }

    // ==================== Binary Values ====================

    /// A handle to value `index` of the binary property at `path`.
    pub fn lazy_binary(&mut self, path: &str, index: usize) -> SessionResult<LazyBinary> {
        let property = self.property(path)?;
        let path = Self::parse_path(path)?;
        if !property.property_type().is_binary() {
            return Err(SessionError::invalid_argument(format!(
                "{} is not a binary property",
                path
            )));
        }
        if index >= property.values().len() {
            return Err(SessionError::invalid_argument(format!(
                "{} has no value {}",
                path, index
            )));
        }
        Ok(LazyBinary::new(self.key, path, index))
    }

    // ==================== Unsupported ====================

    pub fn impersonate(&self, _credentials: Credentials) -> SessionResult<Session> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "impersonate",
        })
    }

    pub fn access_control_manager(&self) -> SessionResult<AccessControlManager> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "access_control_manager",
        })
    }

    pub fn retention_manager(&self) -> SessionResult<RetentionManager> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "retention_manager",
        })
    }

    pub fn add_lock_token(&mut self, _token: &str) -> SessionResult<()> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "add_lock_token",
        })
    }

    pub fn lock_tokens(&self) -> SessionResult<Vec<String>> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "lock_tokens",
        })
    }

    pub fn remove_lock_token(&mut self, _token: &str) -> SessionResult<()> {
        self.ensure_live()?;
        Err(SessionError::UnsupportedOperation {
            operation: "remove_lock_token",
        })
    }

    /// Reload the cache from the repository.
    pub fn refresh(&mut self, _keep_changes: bool) -> SessionResult<()> {
        self.ensure_live()?;
        Err(SessionError::NotImplemented { operation: "refresh" })
    }

    /// Import serialized content below `parent`.
    pub fn import_xml<R: Read>(
        &mut self,
        _parent: &str,
        _input: &mut R,
        _uuid_behavior: ImportUuidBehavior,
    ) -> SessionResult<()> {
        self.ensure_live()?;
        Err(SessionError::NotImplemented {
            operation: "import_xml",
        })
    }

    // ==================== Internal Access ====================

    #[doc(hidden)]
    pub fn object_manager(&mut self) -> &mut ObjectManager {
        &mut self.objects
    }

    #[doc(hidden)]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.logout();
    }
}
