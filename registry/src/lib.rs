//! Cairn Namespace Registry
//!
//! Read-only prefix ↔ URI lookup used by sessions and export codecs.
//!
//! Responsibilities:
//! - Hold the built-in namespaces every repository defines
//! - Merge namespaces reported by the remote repository
//! - Enumerate prefixes in a stable order for serialization

mod builder;
mod registry;

pub use builder::{NamespaceRegistryBuilder, RegistryError, RegistryResult};
pub use registry::{NamespaceRegistry, BUILTIN_NAMESPACES};
