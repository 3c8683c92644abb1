//! Permission action names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An action a session may be permitted to perform at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    /// Read an item.
    Read,
    /// Add a child node.
    AddNode,
    /// Set or change a property.
    SetProperty,
    /// Remove an item.
    Remove,
}

impl Permission {
    /// Every action.
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::AddNode,
        Permission::SetProperty,
        Permission::Remove,
    ];

    /// The standard action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::AddNode => "add_node",
            Permission::SetProperty => "set_property",
            Permission::Remove => "remove",
        }
    }

    /// Parse a standard action name.
    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == action)
    }

    /// Parse a comma-separated action list such as `"read,add_node"`.
    ///
    /// Returns the first unknown action name on failure.
    pub fn parse_list(actions: &str) -> Result<Vec<Self>, String> {
        actions
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| Self::parse(a).ok_or_else(|| a.to_string()))
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
