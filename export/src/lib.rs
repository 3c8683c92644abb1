//! Cairn Export
//!
//! XML serialization of repository subtrees.
//!
//! Responsibilities:
//! - Write the system view: every node and property with its declared type
//! - Write the document view: nodes as elements, single values as attributes
//! - Escape item names into valid XML names, reversibly
//!
//! Writers pull children through a [`NodeSource`] so they never depend on
//! how nodes are cached or loaded.

mod document_view;
mod error;
mod escape;
mod options;
mod system_view;

pub use document_view::export_document_view;
pub use error::{ExportError, ExportResult};
pub use escape::{escape_name, unescape_name};
pub use options::ExportOptions;
pub use system_view::export_system_view;

use cairn_core::{Node, Path};

/// Declaration line every export starts with.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Where the writers get the rest of the subtree from.
pub trait NodeSource {
    type Error: std::error::Error + 'static;

    /// The children of `node`, in child order.
    fn children(&mut self, node: &Node) -> Result<Vec<Node>, Self::Error>;

    /// Whether the caller may read the node at `path`. Unreadable nodes are
    /// left out together with their subtrees.
    fn can_read(&mut self, path: &Path) -> Result<bool, Self::Error>;
}

/// Write ` xmlns:prefix="uri"` for every non-empty registered prefix.
fn write_namespaces<W: std::io::Write>(
    out: &mut W,
    registry: &cairn_registry::NamespaceRegistry,
) -> std::io::Result<()> {
    for (prefix, uri) in registry.iter() {
        if !prefix.is_empty() {
            write!(out, " xmlns:{}=\"{}\"", prefix, quick_xml::escape::escape(uri))?;
        }
    }
    Ok(())
}

/// The children of `node` the source lets the caller read.
fn readable_children<S: NodeSource>(
    source: &mut S,
    node: &Node,
) -> Result<Vec<Node>, S::Error> {
    let mut readable = Vec::new();
    for child in source.children(node)? {
        if source.can_read(child.path())? {
            readable.push(child);
        }
    }
    Ok(readable)
}
