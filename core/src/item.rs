//! Item snapshots.
//!
//! A session hands out owned snapshots of nodes and properties. A snapshot
//! reflects the session's view (remote state plus pending changes) at the
//! time of the lookup; it is not updated when that view changes.

use crate::names::{is_protected_property, JCR_MIXIN_TYPES, JCR_PRIMARY_TYPE, JCR_UUID, MIX_REFERENCEABLE};
use crate::{Path, PathSegment, PropertyData, PropertyType, Value};

/// A property snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    path: Path,
    data: PropertyData,
}

impl Property {
    /// Create a property snapshot below `node_path`. Property names follow
    /// the same rules as node names.
    pub fn new(node_path: &Path, data: PropertyData) -> crate::PathResult<Self> {
        let path = node_path.child(&data.name, 1)?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn property_type(&self) -> PropertyType {
        self.data.property_type
    }

    pub fn is_multiple(&self) -> bool {
        self.data.multiple
    }

    /// All values; a single-valued property has exactly one.
    pub fn values(&self) -> &[Value] {
        &self.data.values
    }

    /// The value of a single-valued property, `None` if multi-valued.
    pub fn value(&self) -> Option<&Value> {
        if self.data.multiple {
            None
        } else {
            self.data.values.first()
        }
    }

    /// The text of a single-valued, non-binary property.
    pub fn text(&self) -> Option<&str> {
        self.value().and_then(Value::as_text)
    }

    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    pub fn into_data(self) -> PropertyData {
        self.data
    }
}

/// A node snapshot.
///
/// The property list always starts with the repository-managed properties:
/// `jcr:primaryType`, then `jcr:mixinTypes` if the node has mixins, then
/// `jcr:uuid` if it has an identifier. Stored properties follow in
/// insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    path: Path,
    primary_type: String,
    mixin_types: Vec<String>,
    identifier: Option<String>,
    properties: Vec<Property>,
    children: Vec<PathSegment>,
}

impl Node {
    /// Start building a node snapshot.
    pub fn builder(path: Path, primary_type: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            path,
            primary_type: primary_type.into(),
            mixin_types: Vec::new(),
            identifier: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The node name without index; empty for the root.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The 1-based same-name-sibling index.
    pub fn index(&self) -> usize {
        self.path.index()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn mixin_types(&self) -> &[String] {
        &self.mixin_types
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Whether the node carries the referenceable capability.
    pub fn is_referenceable(&self) -> bool {
        self.mixin_types.iter().any(|m| m == MIX_REFERENCEABLE)
    }

    /// Whether the node is of `node_type` as primary type or mixin.
    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.primary_type == node_type || self.mixin_types.iter().any(|m| m == node_type)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Child segments in child order.
    pub fn children(&self) -> &[PathSegment] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Absolute paths of the children in child order.
    pub fn child_paths(&self) -> Vec<Path> {
        self.children
            .iter()
            .map(|segment| self.path.join(segment.clone()))
            .collect()
    }
}

/// Builder for [`Node`] snapshots.
#[derive(Debug)]
pub struct NodeBuilder {
    path: Path,
    primary_type: String,
    mixin_types: Vec<String>,
    identifier: Option<String>,
    properties: Vec<PropertyData>,
    children: Vec<PathSegment>,
}

impl NodeBuilder {
    pub fn mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixin_types.push(mixin.into());
        self
    }

    pub fn mixins<I, S>(mut self, mixins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mixin_types.extend(mixins.into_iter().map(Into::into));
        self
    }

    pub fn identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }

    /// Add a stored property. Protected names are ignored; they are
    /// derived from the node's type and identifier.
    pub fn property(mut self, data: PropertyData) -> Self {
        if !is_protected_property(&data.name) {
            self.properties.push(data);
        }
        self
    }

    pub fn properties(mut self, data: impl IntoIterator<Item = PropertyData>) -> Self {
        for d in data {
            self = self.property(d);
        }
        self
    }

    pub fn child(mut self, segment: PathSegment) -> Self {
        self.children.push(segment);
        self
    }

    pub fn children(mut self, segments: impl IntoIterator<Item = PathSegment>) -> Self {
        self.children.extend(segments);
        self
    }

    pub fn build(self) -> crate::PathResult<Node> {
        let mut all = Vec::with_capacity(self.properties.len() + 3);
        all.push(PropertyData::single(
            JCR_PRIMARY_TYPE,
            PropertyType::Name,
            Value::Text(self.primary_type.clone()),
        ));
        if !self.mixin_types.is_empty() {
            all.push(PropertyData::multiple(
                JCR_MIXIN_TYPES,
                PropertyType::Name,
                self.mixin_types.iter().cloned().map(Value::Text).collect(),
            ));
        }
        if let Some(identifier) = &self.identifier {
            all.push(PropertyData::single(
                JCR_UUID,
                PropertyType::String,
                Value::Text(identifier.clone()),
            ));
        }
        all.extend(self.properties);

        let properties = all
            .into_iter()
            .map(|data| Property::new(&self.path, data))
            .collect::<crate::PathResult<Vec<_>>>()?;

        Ok(Node {
            path: self.path,
            primary_type: self.primary_type,
            mixin_types: self.mixin_types,
            identifier: self.identifier,
            properties,
            children: self.children,
        })
    }
}

/// Either kind of item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Property(Property),
}

impl Item {
    pub fn path(&self) -> &Path {
        match self {
            Item::Node(n) => n.path(),
            Item::Property(p) => p.path(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(n) => Some(n),
            Item::Property(_) => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Item::Node(_) => None,
            Item::Property(p) => Some(p),
        }
    }
}
