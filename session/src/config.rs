//! Repository configuration and per-session options.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{SessionError, SessionResult};

/// Settings shared by every session of a repository.
///
/// ```toml
/// default_workspace = "default"
/// fetch_depth = 2
///
/// [namespaces]
/// app = "urn:example:app"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Workspace used when a login names none.
    pub default_workspace: String,
    /// Descendant levels each node load prefetches.
    pub fetch_depth: usize,
    /// Extra prefix/URI mappings registered in every session.
    pub namespaces: BTreeMap<String, String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_workspace: "default".to_string(),
            fetch_depth: 0,
            namespaces: BTreeMap::new(),
        }
    }
}

impl RepositoryConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        toml::from_str(text).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Read a configuration file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> SessionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Options a session can change after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOption {
    /// Descendant levels each node load prefetches.
    FetchDepth,
}
