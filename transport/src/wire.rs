//! Wire types exchanged with the remote repository.

use cairn_core::{Path, PropertyData};
use serde::{Deserialize, Serialize};

/// The state of one node as reported by the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Primary node type.
    pub primary_type: String,
    /// Mixin node types.
    #[serde(default)]
    pub mixin_types: Vec<String>,
    /// Identifier of a referenceable node.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Stored properties, without the repository-managed ones.
    #[serde(default)]
    pub properties: Vec<PropertyData>,
    /// Child names in child order; same-name siblings repeat their name.
    #[serde(default)]
    pub children: Vec<String>,
}

/// One recorded change. Paths are those of the session's view at the time
/// the change was recorded, so a batch must be applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddNode {
        parent: Path,
        name: String,
        primary_type: String,
        identifier: Option<String>,
    },
    AddMixin {
        path: Path,
        mixin: String,
        identifier: Option<String>,
    },
    SetProperty {
        node: Path,
        property: PropertyData,
    },
    RemoveProperty {
        node: Path,
        name: String,
    },
    Move {
        source: Path,
        destination: Path,
    },
    RemoveNode {
        path: Path,
    },
}

impl Operation {
    /// Short operation name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AddNode { .. } => "add_node",
            Operation::AddMixin { .. } => "add_mixin",
            Operation::SetProperty { .. } => "set_property",
            Operation::RemoveProperty { .. } => "remove_property",
            Operation::Move { .. } => "move",
            Operation::RemoveNode { .. } => "remove_node",
        }
    }
}

/// An ordered set of changes committed as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    operations: Vec<Operation>,
}

impl ChangeBatch {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
