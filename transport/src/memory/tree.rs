//! In-memory repository tree.

use crate::{NodeData, Operation, TransportError, TransportResult};
use cairn_core::names::{is_protected_property, MIX_REFERENCEABLE, REP_ROOT};
use cairn_core::{validate_name, Path, PathSegment, PropertyData, PropertyType};
use std::collections::{HashMap, HashSet};

/// Key of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey(u64);

/// Key allocator for tree nodes.
#[derive(Debug, Clone)]
struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn alloc(&mut self) -> NodeKey {
        let key = NodeKey(self.next);
        self.next += 1;
        key
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    name: String,
    parent: Option<NodeKey>,
    primary_type: String,
    mixin_types: Vec<String>,
    identifier: Option<String>,
    properties: Vec<PropertyData>,
    children: Vec<NodeKey>,
}

impl TreeNode {
    fn new(name: String, parent: Option<NodeKey>, primary_type: String) -> Self {
        Self {
            name,
            parent,
            primary_type,
            mixin_types: Vec::new(),
            identifier: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A workspace's content tree: the authoritative state held by
/// [`MemoryTransport`](crate::MemoryTransport).
///
/// All mutators validate their input and leave the tree untouched on error.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Node storage
    nodes: HashMap<NodeKey, TreeNode>,
    /// Root node key
    root: NodeKey,
    /// Identifier index
    identifiers: HashMap<String, NodeKey>,
    /// Key allocator
    keys: KeyAllocator,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        let mut keys = KeyAllocator::new();
        let root = keys.alloc();
        let mut nodes = HashMap::new();
        nodes.insert(root, TreeNode::new(String::new(), None, REP_ROOT.to_string()));
        Self {
            nodes,
            root,
            identifiers: HashMap::new(),
            keys,
        }
    }

    // ==================== Navigation ====================

    fn node(&self, key: NodeKey) -> TransportResult<&TreeNode> {
        self.nodes
            .get(&key)
            .ok_or_else(|| TransportError::unavailable(format!("dangling tree key {}", key.0)))
    }

    fn node_mut(&mut self, key: NodeKey) -> TransportResult<&mut TreeNode> {
        self.nodes
            .get_mut(&key)
            .ok_or_else(|| TransportError::unavailable(format!("dangling tree key {}", key.0)))
    }

    fn resolve(&self, path: &Path) -> Option<NodeKey> {
        let mut current = self.root;
        for segment in path.segments() {
            let node = self.nodes.get(&current)?;
            current = node
                .children
                .iter()
                .copied()
                .filter(|child| {
                    self.nodes
                        .get(child)
                        .is_some_and(|c| c.name == segment.name())
                })
                .nth(segment.index() - 1)?;
        }
        Some(current)
    }

    fn require(&self, path: &Path) -> TransportResult<NodeKey> {
        self.resolve(path)
            .ok_or_else(|| TransportError::item_not_found(path))
    }

    fn path_of(&self, key: NodeKey) -> TransportResult<Path> {
        let mut segments = Vec::new();
        let mut current = key;
        while let Some(parent) = self.node(current)?.parent {
            let name = &self.node(current)?.name;
            let mut index = 1;
            for sibling in &self.node(parent)?.children {
                if *sibling == current {
                    break;
                }
                if self.node(*sibling)?.name == *name {
                    index += 1;
                }
            }
            segments.push(PathSegment::new(name.clone(), index)
                .map_err(|e| TransportError::unavailable(e.to_string()))?);
            current = parent;
        }
        Ok(segments
            .into_iter()
            .rev()
            .fold(Path::root(), |path, segment| path.join(segment)))
    }

    /// Keys of the subtree rooted at `key`, parents before children.
    fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev());
            }
        }
        result
    }

    fn data_of(&self, key: NodeKey) -> TransportResult<NodeData> {
        let node = self.node(key)?;
        let children = node
            .children
            .iter()
            .map(|c| self.node(*c).map(|n| n.name.clone()))
            .collect::<TransportResult<Vec<_>>>()?;
        Ok(NodeData {
            primary_type: node.primary_type.clone(),
            mixin_types: node.mixin_types.clone(),
            identifier: node.identifier.clone(),
            properties: node.properties.clone(),
            children,
        })
    }

    // ==================== Queries ====================

    /// Check if a node exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }

    /// The state of the node at `path`.
    pub fn node_data(&self, path: &Path) -> Option<NodeData> {
        self.resolve(path).and_then(|key| self.data_of(key).ok())
    }

    /// The node at `path` and its descendants up to `depth` levels below,
    /// parents before children.
    pub fn fetch(&self, path: &Path, depth: usize) -> TransportResult<Vec<(Path, NodeData)>> {
        let key = self.require(path)?;
        let mut result = Vec::new();
        let mut stack = vec![(key, path.clone(), 0usize)];
        while let Some((current, current_path, level)) = stack.pop() {
            result.push((current_path.clone(), self.data_of(current)?));
            if level < depth {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                let mut children = Vec::new();
                for child in &self.node(current)?.children {
                    let name = self.node(*child)?.name.as_str();
                    let index = counts.entry(name).or_insert(0);
                    *index += 1;
                    let child_path = current_path
                        .child(name, *index)
                        .map_err(|e| TransportError::unavailable(e.to_string()))?;
                    children.push((*child, child_path, level + 1));
                }
                stack.extend(children.into_iter().rev());
            }
        }
        Ok(result)
    }

    /// The property at `path` (parent node path plus property name).
    pub fn property(&self, path: &Path) -> Option<&PropertyData> {
        let node = self.nodes.get(&self.resolve(&path.parent()?)?)?;
        node.properties.iter().find(|p| p.name == path.name())
    }

    /// The current path of the node carrying `identifier`.
    pub fn path_for_identifier(&self, identifier: &str) -> Option<Path> {
        self.identifiers
            .get(identifier)
            .and_then(|key| self.path_of(*key).ok())
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    // ==================== Mutations ====================

    /// Append a child node, returning its path.
    pub fn add_node(&mut self, parent: &Path, name: &str, primary_type: &str) -> TransportResult<Path> {
        self.add_node_with_identifier(parent, name, primary_type, None)
    }

    /// Append a child node carrying an identifier.
    pub fn add_node_with_identifier(
        &mut self,
        parent: &Path,
        name: &str,
        primary_type: &str,
        identifier: Option<String>,
    ) -> TransportResult<Path> {
        validate_name(name).map_err(|e| TransportError::constraint_violation(e.to_string()))?;
        let parent_key = self.require(parent)?;
        if let Some(id) = &identifier {
            self.ensure_identifier_free(id)?;
        }

        let key = self.keys.alloc();
        let mut node = TreeNode::new(name.to_string(), Some(parent_key), primary_type.to_string());
        node.identifier = identifier.clone();
        self.nodes.insert(key, node);
        self.node_mut(parent_key)?.children.push(key);
        if let Some(id) = identifier {
            self.identifiers.insert(id, key);
        }
        self.path_of(key)
    }

    /// Add a mixin. Adding `mix:referenceable` to a node without identifier
    /// assigns `identifier`, or a fresh one when `None`.
    pub fn add_mixin(&mut self, path: &Path, mixin: &str, identifier: Option<String>) -> TransportResult<()> {
        let key = self.require(path)?;
        if self.node(key)?.mixin_types.iter().any(|m| m == mixin) {
            return Ok(());
        }

        let assigned = if mixin == MIX_REFERENCEABLE && self.node(key)?.identifier.is_none() {
            let id = identifier.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            self.ensure_identifier_free(&id)?;
            Some(id)
        } else {
            None
        };

        let node = self.node_mut(key)?;
        node.mixin_types.push(mixin.to_string());
        if let Some(id) = assigned {
            node.identifier = Some(id.clone());
            self.identifiers.insert(id, key);
        }
        Ok(())
    }

    /// Set a property, replacing one of the same name.
    pub fn set_property(&mut self, node: &Path, property: PropertyData) -> TransportResult<()> {
        if is_protected_property(&property.name) {
            return Err(TransportError::constraint_violation(format!(
                "property {} is protected",
                property.name
            )));
        }
        validate_name(&property.name)
            .map_err(|e| TransportError::constraint_violation(e.to_string()))?;
        if !property.multiple && property.values.len() != 1 {
            return Err(TransportError::constraint_violation(format!(
                "single-valued property {} must have exactly one value",
                property.name
            )));
        }

        let key = self.require(node)?;
        let target = self.node_mut(key)?;
        match target.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => target.properties.push(property),
        }
        Ok(())
    }

    /// Remove a property.
    pub fn remove_property(&mut self, node: &Path, name: &str) -> TransportResult<()> {
        if is_protected_property(name) {
            return Err(TransportError::constraint_violation(format!(
                "property {} is protected",
                name
            )));
        }
        let key = self.require(node)?;
        let target = self.node_mut(key)?;
        let before = target.properties.len();
        target.properties.retain(|p| p.name != name);
        if target.properties.len() == before {
            let path = node
                .child(name, 1)
                .map(|p| p.to_string())
                .unwrap_or_else(|_| format!("{}/{}", node, name));
            return Err(TransportError::ItemNotFound { path });
        }
        Ok(())
    }

    /// Move a node below a new parent, appending it as the last child.
    pub fn move_node(&mut self, source: &Path, destination: &Path) -> TransportResult<()> {
        let key = self.require(source)?;
        if key == self.root {
            return Err(TransportError::constraint_violation("the root node cannot be moved"));
        }
        let dest_parent = destination
            .parent()
            .ok_or_else(|| TransportError::constraint_violation("cannot move onto the root path"))?;
        if destination.index() != 1 {
            return Err(TransportError::constraint_violation(format!(
                "move destination {} must not carry an index",
                destination
            )));
        }
        let dest_parent_key = self.require(&dest_parent)?;
        if self.subtree(key).contains(&dest_parent_key) {
            return Err(TransportError::constraint_violation(format!(
                "cannot move {} below itself",
                source
            )));
        }

        let old_parent = self
            .node(key)?
            .parent
            .ok_or_else(|| TransportError::constraint_violation("the root node cannot be moved"))?;
        self.node_mut(old_parent)?.children.retain(|c| *c != key);
        self.node_mut(dest_parent_key)?.children.push(key);
        let node = self.node_mut(key)?;
        node.parent = Some(dest_parent_key);
        node.name = destination.name().to_string();
        Ok(())
    }

    /// Remove a node and its subtree.
    ///
    /// Fails with a referential-integrity error while a `Reference`
    /// property outside the subtree points into it.
    pub fn remove_node(&mut self, path: &Path) -> TransportResult<()> {
        let key = self.require(path)?;
        if key == self.root {
            return Err(TransportError::constraint_violation("the root node cannot be removed"));
        }

        let doomed = self.subtree(key);
        let doomed_set: HashSet<NodeKey> = doomed.iter().copied().collect();
        let doomed_ids: HashSet<&str> = doomed
            .iter()
            .filter_map(|k| self.nodes.get(k).and_then(|n| n.identifier.as_deref()))
            .collect();
        if !doomed_ids.is_empty() {
            for (other_key, other) in &self.nodes {
                if doomed_set.contains(other_key) {
                    continue;
                }
                for property in &other.properties {
                    if property.property_type != PropertyType::Reference {
                        continue;
                    }
                    if property
                        .values
                        .iter()
                        .filter_map(|v| v.as_text())
                        .any(|v| doomed_ids.contains(v))
                    {
                        return Err(TransportError::referential_integrity(format!(
                            "{} is referenced by property {} of {}",
                            path,
                            property.name,
                            self.path_of(*other_key)?
                        )));
                    }
                }
            }
        }

        if let Some(parent) = self.node(key)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != key);
        }
        for k in doomed {
            if let Some(node) = self.nodes.remove(&k) {
                if let Some(id) = node.identifier {
                    self.identifiers.remove(&id);
                }
            }
        }
        Ok(())
    }

    /// Apply one recorded operation.
    pub fn apply(&mut self, operation: &Operation) -> TransportResult<()> {
        match operation {
            Operation::AddNode {
                parent,
                name,
                primary_type,
                identifier,
            } => self
                .add_node_with_identifier(parent, name, primary_type, identifier.clone())
                .map(|_| ()),
            Operation::AddMixin {
                path,
                mixin,
                identifier,
            } => self.add_mixin(path, mixin, identifier.clone()),
            Operation::SetProperty { node, property } => self.set_property(node, property.clone()),
            Operation::RemoveProperty { node, name } => self.remove_property(node, name),
            Operation::Move {
                source,
                destination,
            } => self.move_node(source, destination),
            Operation::RemoveNode { path } => self.remove_node(path),
        }
    }

    fn ensure_identifier_free(&self, identifier: &str) -> TransportResult<()> {
        if self.identifiers.contains_key(identifier) {
            return Err(TransportError::constraint_violation(format!(
                "identifier {} is already in use",
                identifier
            )));
        }
        Ok(())
    }
}
