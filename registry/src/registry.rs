//! The NamespaceRegistry - immutable prefix/URI lookup.

use crate::{NamespaceRegistryBuilder, RegistryError, RegistryResult};

/// Namespaces defined by every repository, in enumeration order.
pub const BUILTIN_NAMESPACES: [(&str, &str); 6] = [
    ("jcr", "http://www.jcp.org/jcr/1.0"),
    ("sv", "http://www.jcp.org/jcr/sv/1.0"),
    ("nt", "http://www.jcp.org/jcr/nt/1.0"),
    ("mix", "http://www.jcp.org/jcr/mix/1.0"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
    ("", ""),
];

/// The NamespaceRegistry provides runtime lookup of namespace mappings.
/// It is immutable after construction; mappings keep registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    /// (prefix, uri) pairs in registration order.
    entries: Vec<(String, String)>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceRegistry {
    /// Create a registry holding only the built-in namespaces.
    pub fn new() -> Self {
        Self::from_entries(
            BUILTIN_NAMESPACES
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
        )
    }

    /// Start a builder seeded with the built-in namespaces.
    pub fn builder() -> NamespaceRegistryBuilder {
        NamespaceRegistryBuilder::new()
    }

    pub(crate) fn from_entries(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    // ==================== Lookups ====================

    /// Get the URI mapped to a prefix.
    pub fn uri(&self, prefix: &str) -> RegistryResult<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
            .ok_or_else(|| RegistryError::unknown_prefix(prefix))
    }

    /// Get the prefix mapped to a URI.
    pub fn prefix(&self, uri: &str) -> RegistryResult<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
            .ok_or_else(|| RegistryError::unknown_uri(uri))
    }

    /// Check if a prefix is registered.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries.iter().any(|(p, _)| p == prefix)
    }

    /// All registered prefixes, including the empty default prefix.
    pub fn prefixes(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// All registered URIs.
    pub fn uris(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, u)| u.as_str()).collect()
    }

    /// Iterate over (prefix, uri) pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Get the number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
