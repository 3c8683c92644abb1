//! NamespaceRegistryBuilder for constructing an immutable NamespaceRegistry.

use crate::registry::BUILTIN_NAMESPACES;
use crate::NamespaceRegistry;
use thiserror::Error;

/// Errors that can occur during registry construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown namespace prefix: {prefix}")]
    UnknownPrefix { prefix: String },

    #[error("unknown namespace uri: {uri}")]
    UnknownUri { uri: String },

    #[error("prefix '{prefix}' is already mapped to {existing}")]
    PrefixConflict { prefix: String, existing: String },

    #[error("uri {uri} is already mapped to prefix '{existing}'")]
    UriConflict { uri: String, existing: String },

    #[error("built-in prefix '{prefix}' cannot be remapped")]
    ReservedPrefix { prefix: String },

    #[error("invalid namespace prefix: '{prefix}'")]
    InvalidPrefix { prefix: String },
}

impl RegistryError {
    pub fn unknown_prefix(prefix: impl Into<String>) -> Self {
        Self::UnknownPrefix {
            prefix: prefix.into(),
        }
    }

    pub fn unknown_uri(uri: impl Into<String>) -> Self {
        Self::UnknownUri { uri: uri.into() }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builder for constructing an immutable NamespaceRegistry.
#[derive(Debug)]
pub struct NamespaceRegistryBuilder {
    /// (prefix, uri) pairs in registration order, built-ins first.
    entries: Vec<(String, String)>,
}

impl Default for NamespaceRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceRegistryBuilder {
    /// Create a new builder seeded with the built-in namespaces.
    pub fn new() -> Self {
        Self {
            entries: BUILTIN_NAMESPACES
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
        }
    }

    /// Register a prefix/URI mapping.
    ///
    /// Registering a mapping that already exists verbatim is a no-op, so
    /// a remote repository may report the built-ins again.
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> RegistryResult<&mut Self> {
        let prefix = prefix.into();
        let uri = uri.into();

        if let Some((_, existing)) = self.entries.iter().find(|(p, _)| *p == prefix) {
            if *existing == uri {
                return Ok(self);
            }
            if BUILTIN_NAMESPACES.iter().any(|(p, _)| *p == prefix) {
                return Err(RegistryError::ReservedPrefix { prefix });
            }
            return Err(RegistryError::PrefixConflict {
                existing: existing.clone(),
                prefix,
            });
        }
        if let Some((existing, _)) = self.entries.iter().find(|(_, u)| *u == uri) {
            return Err(RegistryError::UriConflict {
                existing: existing.clone(),
                uri,
            });
        }
        if prefix.is_empty()
            || prefix.contains(':')
            || prefix.to_ascii_lowercase().starts_with("xml")
            || cairn_core::validate_name(&prefix).is_err()
        {
            return Err(RegistryError::InvalidPrefix { prefix });
        }

        self.entries.push((prefix, uri));
        Ok(self)
    }

    /// Build the registry.
    pub fn build(self) -> NamespaceRegistry {
        NamespaceRegistry::from_entries(self.entries)
    }
}
