//! The object manager: the session's view of the workspace.
//!
//! Nodes live in a slot arena. A slot starts as a stub that only knows its
//! name and remote path; it is loaded from the transport the first time it
//! is needed, together with `fetch_depth` levels of descendants. Mutations
//! change the arena right away and append to the change log, so lookups
//! always see remote state plus pending changes.
//!
//! Slots keep the path their node has on the remote side. Until the log is
//! committed that path stays valid even if the node was moved locally, which
//! is what lets stubs below a moved node load correctly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cairn_core::names::{is_protected_property, MIX_REFERENCEABLE};
use cairn_core::{validate_name, Node, Path, PathSegment, Permission, Property, PropertyData};
use cairn_transport::{LoginId, NodeData, Operation, Transport};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{ChangeLog, ObjectError, ObjectResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotId(u64);

#[derive(Debug, Clone)]
struct NodeRecord {
    primary_type: String,
    mixin_types: Vec<String>,
    identifier: Option<String>,
    properties: Vec<PropertyData>,
    children: Vec<SlotId>,
}

impl NodeRecord {
    fn new(primary_type: impl Into<String>) -> Self {
        Self {
            primary_type: primary_type.into(),
            mixin_types: Vec::new(),
            identifier: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    name: String,
    parent: Option<SlotId>,
    /// Path on the remote side; `None` for nodes added locally.
    remote_path: Option<Path>,
    /// `None` while the slot is an unloaded stub.
    record: Option<NodeRecord>,
}

/// Cache, lazy loader and change log for one session.
pub struct ObjectManager {
    transport: Arc<dyn Transport>,
    login: LoginId,
    workspace: String,
    /// Descendant levels prefetched with every load.
    fetch_depth: usize,
    slots: HashMap<SlotId, Slot>,
    root: SlotId,
    /// Remote path -> slot, for every slot that has one.
    by_remote: HashMap<Path, SlotId>,
    next_slot: u64,
    changes: ChangeLog,
}

impl fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectManager")
            .field("login", &self.login)
            .field("workspace", &self.workspace)
            .field("fetch_depth", &self.fetch_depth)
            .field("cached", &self.slots.len())
            .field("pending", &self.changes.len())
            .finish()
    }
}

impl ObjectManager {
    /// Create an object manager with an empty cache for a login to
    /// `workspace`.
    pub fn new(transport: Arc<dyn Transport>, login: LoginId, workspace: impl Into<String>) -> Self {
        let mut manager = Self {
            transport,
            login,
            workspace: workspace.into(),
            fetch_depth: 0,
            slots: HashMap::new(),
            root: SlotId(0),
            by_remote: HashMap::new(),
            next_slot: 0,
            changes: ChangeLog::new(),
        };
        manager.reset();
        manager
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn login(&self) -> LoginId {
        self.login
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn fetch_depth(&self) -> usize {
        self.fetch_depth
    }

    /// Set how many descendant levels each load prefetches.
    pub fn set_fetch_depth(&mut self, depth: usize) {
        self.fetch_depth = depth;
    }

    /// Number of cached slots, loaded or not.
    pub fn cached_len(&self) -> usize {
        self.slots.len()
    }

    // ==================== Slot Arena ====================

    fn alloc(&mut self, slot: Slot) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        if let Some(remote) = &slot.remote_path {
            self.by_remote.insert(remote.clone(), id);
        }
        self.slots.insert(id, slot);
        id
    }

    /// Drop every cached node, leaving an unloaded root.
    fn reset(&mut self) {
        self.slots.clear();
        self.by_remote.clear();
        self.root = self.alloc(Slot {
            name: String::new(),
            parent: None,
            remote_path: Some(Path::root()),
            record: None,
        });
    }

    fn slot(&self, id: SlotId) -> ObjectResult<&Slot> {
        self.slots
            .get(&id)
            .ok_or_else(|| ObjectError::internal(format!("dangling slot {}", id.0)))
    }

    fn slot_mut(&mut self, id: SlotId) -> ObjectResult<&mut Slot> {
        self.slots
            .get_mut(&id)
            .ok_or_else(|| ObjectError::internal(format!("dangling slot {}", id.0)))
    }

    fn record(&self, id: SlotId) -> ObjectResult<&NodeRecord> {
        self.slot(id)?
            .record
            .as_ref()
            .ok_or_else(|| ObjectError::internal(format!("slot {} is not loaded", id.0)))
    }

    fn record_mut(&mut self, id: SlotId) -> ObjectResult<&mut NodeRecord> {
        self.slot_mut(id)?
            .record
            .as_mut()
            .ok_or_else(|| ObjectError::internal(format!("slot {} is not loaded", id.0)))
    }

    /// Remove a detached subtree from the arena.
    fn drop_subtree(&mut self, id: SlotId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.slots.remove(&current) {
                if let Some(remote) = &slot.remote_path {
                    if self.by_remote.get(remote) == Some(&current) {
                        self.by_remote.remove(remote);
                    }
                }
                if let Some(record) = slot.record {
                    stack.extend(record.children);
                }
            }
        }
    }

    fn is_within(&self, candidate: SlotId, ancestor: SlotId) -> ObjectResult<bool> {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.slot(id)?.parent;
        }
        Ok(false)
    }

    // ==================== Loading ====================

    fn ensure_loaded(&mut self, id: SlotId) -> ObjectResult<()> {
        let slot = self.slot(id)?;
        if slot.record.is_some() {
            return Ok(());
        }
        let remote = slot
            .remote_path
            .clone()
            .ok_or_else(|| ObjectError::internal(format!("local slot {} has no record", id.0)))?;

        let fetched = self
            .transport
            .fetch_node(self.login, &remote, self.fetch_depth)?;
        trace!(path = %remote, nodes = fetched.len(), "loaded");
        for (path, data) in fetched {
            let target = if path == remote {
                Some(id)
            } else {
                self.by_remote.get(&path).copied()
            };
            if let Some(target) = target {
                self.fill(target, &path, data)?;
            }
        }

        if self.slot(id)?.record.is_none() {
            return Err(ObjectError::item_not_found(remote));
        }
        Ok(())
    }

    /// Load a stub from fetched data, creating stubs for its children.
    fn fill(&mut self, id: SlotId, remote: &Path, data: NodeData) -> ObjectResult<()> {
        if self.slot(id)?.record.is_some() {
            return Ok(());
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut children = Vec::with_capacity(data.children.len());
        for name in data.children {
            let index = counts.entry(name.clone()).or_insert(0);
            *index += 1;
            let child_remote = remote.child(&name, *index)?;
            children.push(self.alloc(Slot {
                name,
                parent: Some(id),
                remote_path: Some(child_remote),
                record: None,
            }));
        }

        self.slot_mut(id)?.record = Some(NodeRecord {
            primary_type: data.primary_type,
            mixin_types: data.mixin_types,
            identifier: data.identifier,
            properties: data.properties,
            children,
        });
        Ok(())
    }

    // ==================== Resolution ====================

    /// Resolve a path in the local view, loading as needed.
    fn resolve(&mut self, path: &Path) -> ObjectResult<SlotId> {
        let mut current = self.root;
        for segment in path.segments() {
            self.ensure_loaded(current)?;
            let mut seen = 0;
            let mut next = None;
            for child in &self.record(current)?.children {
                if self.slot(*child)?.name == segment.name() {
                    seen += 1;
                    if seen == segment.index() {
                        next = Some(*child);
                        break;
                    }
                }
            }
            current = next.ok_or_else(|| ObjectError::item_not_found(path))?;
        }
        self.ensure_loaded(current)?;
        Ok(current)
    }

    /// The local slot of the node at `remote` on the remote side, `None`
    /// if that node was removed locally.
    fn locate_remote(&mut self, remote: &Path) -> ObjectResult<Option<SlotId>> {
        let mut current = self.root;
        let mut prefix = Path::root();
        for segment in remote.segments() {
            self.ensure_loaded(current)?;
            prefix = prefix.join(segment.clone());
            match self.by_remote.get(&prefix) {
                Some(id) => current = *id,
                None => return Ok(None),
            }
        }
        self.ensure_loaded(current)?;
        Ok(Some(current))
    }

    fn find_loaded(&self, identifier: &str) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|(_, slot)| {
                slot.record
                    .as_ref()
                    .and_then(|r| r.identifier.as_deref())
                    == Some(identifier)
            })
            .map(|(id, _)| *id)
    }

    /// The current local path of a slot.
    fn path_of(&self, id: SlotId) -> ObjectResult<Path> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.slot(current)?.parent {
            let name = &self.slot(current)?.name;
            let mut index = 1;
            for sibling in &self.record(parent)?.children {
                if *sibling == current {
                    break;
                }
                if self.slot(*sibling)?.name == *name {
                    index += 1;
                }
            }
            segments.push(PathSegment::new(name.clone(), index)?);
            current = parent;
        }
        Ok(segments
            .into_iter()
            .rev()
            .fold(Path::root(), |path, segment| path.join(segment)))
    }

    fn snapshot(&self, id: SlotId) -> ObjectResult<Node> {
        let path = self.path_of(id)?;
        let record = self.record(id)?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut children = Vec::with_capacity(record.children.len());
        for child in &record.children {
            let name = self.slot(*child)?.name.as_str();
            let index = counts.entry(name).or_insert(0);
            *index += 1;
            children.push(PathSegment::new(name, *index)?);
        }

        Ok(Node::builder(path, record.primary_type.clone())
            .mixins(record.mixin_types.iter().cloned())
            .identifier(record.identifier.clone())
            .properties(record.properties.iter().cloned())
            .children(children)
            .build()?)
    }

    // ==================== Lookups ====================

    /// The node at `path`.
    pub fn node(&mut self, path: &Path) -> ObjectResult<Node> {
        let id = self.resolve(path)?;
        self.snapshot(id)
    }

    /// The node carrying `identifier`.
    pub fn node_by_identifier(&mut self, identifier: &str) -> ObjectResult<Node> {
        if let Some(id) = self.find_loaded(identifier) {
            return self.snapshot(id);
        }

        let remote = match self
            .transport
            .node_path_for_identifier(self.login, identifier)
        {
            Ok(path) => path,
            Err(e) if e.is_not_found() => return Err(ObjectError::identifier_not_found(identifier)),
            Err(e) => return Err(e.into()),
        };
        match self.locate_remote(&remote) {
            Ok(Some(id)) => self.snapshot(id),
            Ok(None) => Err(ObjectError::identifier_not_found(identifier)),
            Err(e) if e.is_not_found() => Err(ObjectError::identifier_not_found(identifier)),
            Err(e) => Err(e),
        }
    }

    /// The property at `path`: its parent node's path plus the property name.
    ///
    /// Property names carry no index. A [`Path`] cannot tell `title[1]`
    /// from `title`, so callers parsing text reject a written index before
    /// getting here.
    pub fn property(&mut self, path: &Path) -> ObjectResult<Property> {
        let parent = path.parent().ok_or_else(|| ObjectError::item_not_found(path))?;
        if path.index() != 1 {
            return Err(ObjectError::item_not_found(path));
        }
        let node = match self.node(&parent) {
            Ok(node) => node,
            Err(e) if e.is_not_found() => return Err(ObjectError::item_not_found(path)),
            Err(e) => return Err(e),
        };
        node.property(path.name())
            .cloned()
            .ok_or_else(|| ObjectError::item_not_found(path))
    }

    /// Nodes at `paths`, in request order. Paths that do not resolve are
    /// left out.
    pub fn nodes(&mut self, paths: &[Path]) -> ObjectResult<Vec<Node>> {
        let mut found = Vec::with_capacity(paths.len());
        for path in paths {
            match self.node(path) {
                Ok(node) => found.push(node),
                Err(e) if e.is_not_found() => debug!(%path, "dropping unresolvable path"),
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// Nodes carrying `identifiers`, in request order. Identifiers that do
    /// not resolve are left out.
    pub fn nodes_by_identifier(&mut self, identifiers: &[&str]) -> ObjectResult<Vec<Node>> {
        let mut found = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            match self.node_by_identifier(identifier) {
                Ok(node) => found.push(node),
                Err(e) if e.is_not_found() => debug!(identifier, "dropping unresolvable identifier"),
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// The readable children of the node at `path`, in child order.
    pub fn children(&mut self, path: &Path) -> ObjectResult<Vec<Node>> {
        let id = self.resolve(path)?;
        let children = self.record(id)?.children.clone();
        let mut result = Vec::with_capacity(children.len());
        for child in children {
            match self.ensure_loaded(child) {
                Ok(()) => result.push(self.snapshot(child)?),
                Err(e) if e.is_not_found() => trace!(%path, "skipping unreadable child"),
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// The path the node at local `path` has on the remote side.
    ///
    /// Nodes moved locally keep their old remote path. Nodes added locally
    /// get the remote path of their nearest stored ancestor extended by the
    /// local suffix.
    pub fn remote_path(&mut self, path: &Path) -> ObjectResult<Path> {
        let mut current = self.resolve(path)?;
        loop {
            let slot = self.slot(current)?;
            if let Some(remote) = &slot.remote_path {
                let remote = remote.clone();
                let local = self.path_of(current)?;
                return Ok(path.rebase(&local, &remote).unwrap_or(remote));
            }
            match slot.parent {
                Some(parent) => current = parent,
                None => return Ok(path.clone()),
            }
        }
    }

    /// The actions granted at `path`.
    pub fn permissions(&self, path: &Path) -> ObjectResult<Vec<Permission>> {
        Ok(self.transport.permissions(self.login, path)?)
    }

    // ==================== Mutations ====================

    /// Append a new child below `parent`, returning its path.
    pub fn add_node(&mut self, parent: &Path, name: &str, primary_type: &str) -> ObjectResult<Path> {
        validate_name(name)?;
        validate_name(primary_type)?;
        let parent_id = self.resolve(parent)?;
        let parent_path = self.path_of(parent_id)?;

        let id = self.alloc(Slot {
            name: name.to_string(),
            parent: Some(parent_id),
            remote_path: None,
            record: Some(NodeRecord::new(primary_type)),
        });
        self.record_mut(parent_id)?.children.push(id);
        self.changes.record(Operation::AddNode {
            parent: parent_path,
            name: name.to_string(),
            primary_type: primary_type.to_string(),
            identifier: None,
        });

        let path = self.path_of(id)?;
        debug!(%path, primary_type, "added node");
        Ok(path)
    }

    /// Add a mixin type. Making a node referenceable assigns it a fresh
    /// identifier.
    pub fn add_mixin(&mut self, path: &Path, mixin: &str) -> ObjectResult<()> {
        validate_name(mixin)?;
        let id = self.resolve(path)?;
        let node_path = self.path_of(id)?;

        let record = self.record_mut(id)?;
        if record.mixin_types.iter().any(|m| m == mixin) {
            return Ok(());
        }
        let identifier = if mixin == MIX_REFERENCEABLE && record.identifier.is_none() {
            Some(Uuid::new_v4().to_string())
        } else {
            None
        };
        record.mixin_types.push(mixin.to_string());
        if identifier.is_some() {
            record.identifier = identifier.clone();
        }

        self.changes.record(Operation::AddMixin {
            path: node_path,
            mixin: mixin.to_string(),
            identifier,
        });
        Ok(())
    }

    /// Set a property on the node at `node`, replacing one of the same name.
    pub fn set_property(&mut self, node: &Path, property: PropertyData) -> ObjectResult<()> {
        if is_protected_property(&property.name) {
            return Err(ObjectError::constraint_violation(format!(
                "property {} is protected",
                property.name
            )));
        }
        validate_name(&property.name)?;
        if !property.multiple && property.values.len() != 1 {
            return Err(ObjectError::constraint_violation(format!(
                "single-valued property {} must have exactly one value",
                property.name
            )));
        }

        let id = self.resolve(node)?;
        let node_path = self.path_of(id)?;
        let record = self.record_mut(id)?;
        match record.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property.clone(),
            None => record.properties.push(property.clone()),
        }

        self.changes.record(Operation::SetProperty {
            node: node_path,
            property,
        });
        Ok(())
    }

    /// Remove the property at `path`.
    pub fn remove_property(&mut self, path: &Path) -> ObjectResult<()> {
        let parent = path.parent().ok_or_else(|| ObjectError::item_not_found(path))?;
        let id = match self.resolve(&parent) {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Err(ObjectError::item_not_found(path)),
            Err(e) => return Err(e),
        };
        let name = path.name().to_string();
        if is_protected_property(&name) {
            return Err(ObjectError::constraint_violation(format!(
                "property {} is protected",
                name
            )));
        }

        let node_path = self.path_of(id)?;
        let record = self.record_mut(id)?;
        let before = record.properties.len();
        record.properties.retain(|p| p.name != name);
        if record.properties.len() == before {
            return Err(ObjectError::item_not_found(path));
        }

        self.changes.record(Operation::RemoveProperty {
            node: node_path,
            name,
        });
        Ok(())
    }

    /// Move the node at `source` to `destination`, appending it as the last
    /// child of the destination's parent.
    pub fn move_node(&mut self, source: &Path, destination: &Path) -> ObjectResult<()> {
        let id = self.resolve(source)?;
        if id == self.root {
            return Err(ObjectError::constraint_violation("the root node cannot be moved"));
        }
        let dest_parent = destination
            .parent()
            .ok_or_else(|| ObjectError::constraint_violation("cannot move onto the root path"))?;
        if destination.index() != 1 {
            return Err(ObjectError::constraint_violation(format!(
                "move destination {} must not carry an index",
                destination
            )));
        }
        let dest_parent_id = self.resolve(&dest_parent)?;
        if self.is_within(dest_parent_id, id)? {
            return Err(ObjectError::constraint_violation(format!(
                "cannot move {} below itself",
                source
            )));
        }

        // Both paths as they are before the node is detached.
        let source_path = self.path_of(id)?;
        let destination_path = self.path_of(dest_parent_id)?.child(destination.name(), 1)?;

        let old_parent = self
            .slot(id)?
            .parent
            .ok_or_else(|| ObjectError::constraint_violation("the root node cannot be moved"))?;
        self.record_mut(old_parent)?.children.retain(|c| *c != id);
        self.record_mut(dest_parent_id)?.children.push(id);
        let slot = self.slot_mut(id)?;
        slot.parent = Some(dest_parent_id);
        slot.name = destination.name().to_string();

        debug!(source = %source_path, destination = %destination_path, "moved node");
        self.changes.record(Operation::Move {
            source: source_path,
            destination: destination_path,
        });
        Ok(())
    }

    /// Remove the node at `path` with its subtree. Later same-name siblings
    /// move up one index.
    pub fn remove_node(&mut self, path: &Path) -> ObjectResult<()> {
        let id = self.resolve(path)?;
        if id == self.root {
            return Err(ObjectError::constraint_violation("the root node cannot be removed"));
        }
        let node_path = self.path_of(id)?;
        let parent = self
            .slot(id)?
            .parent
            .ok_or_else(|| ObjectError::constraint_violation("the root node cannot be removed"))?;

        self.record_mut(parent)?.children.retain(|c| *c != id);
        self.drop_subtree(id);

        debug!(path = %node_path, "removed node");
        self.changes.record(Operation::RemoveNode { path: node_path });
        Ok(())
    }

    // ==================== Commit ====================

    /// Check if there are changes not yet committed.
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The pending changes, oldest first.
    pub fn pending_changes(&self) -> &ChangeLog {
        &self.changes
    }

    /// Send the pending changes to the remote repository as one batch.
    ///
    /// The log is kept; call [`complete_commit`](Self::complete_commit)
    /// once the surrounding transaction is settled.
    pub fn store_pending(&mut self) -> ObjectResult<()> {
        if self.changes.is_empty() {
            return Ok(());
        }
        let batch = self.changes.to_batch();
        self.transport.store(self.login, &batch)?;
        debug!(workspace = %self.workspace, operations = batch.len(), "stored pending changes");
        Ok(())
    }

    /// Forget the stored changes and the cache built on top of them.
    pub fn complete_commit(&mut self) {
        self.changes.clear();
        self.reset();
    }

    /// Store the pending changes and settle the cache.
    pub fn commit(&mut self) -> ObjectResult<()> {
        self.store_pending()?;
        self.complete_commit();
        Ok(())
    }

    /// Discard pending changes and every cached node.
    pub fn clear(&mut self) {
        if !self.changes.is_empty() {
            debug!(discarded = self.changes.len(), "discarding pending changes");
        }
        self.changes.clear();
        self.reset();
    }
}
