//! Document view export.
//!
//! Nodes become elements named after the node, single-valued properties
//! become attributes. Multi-valued properties have no representation and
//! are left out.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cairn_core::names::JCR_ROOT;
use cairn_core::Node;
use cairn_registry::NamespaceRegistry;
use quick_xml::escape::escape;

use crate::{escape_name, readable_children, write_namespaces, ExportError, ExportOptions, ExportResult, NodeSource, XML_DECLARATION};

/// Write the document view of the subtree rooted at `root` to `out`.
pub fn export_document_view<S, W>(
    root: &Node,
    registry: &NamespaceRegistry,
    source: &mut S,
    options: ExportOptions,
    out: &mut W,
) -> ExportResult<(), S::Error>
where
    S: NodeSource,
    W: Write,
{
    out.write_all(XML_DECLARATION.as_bytes())?;
    let mut writer = DocumentViewWriter {
        registry,
        source,
        options,
        out,
    };
    writer.node(root, true)
}

struct DocumentViewWriter<'a, S, W> {
    registry: &'a NamespaceRegistry,
    source: &'a mut S,
    options: ExportOptions,
    out: &'a mut W,
}

impl<S: NodeSource, W: Write> DocumentViewWriter<'_, S, W> {
    fn node(&mut self, node: &Node, outermost: bool) -> ExportResult<(), S::Error> {
        let element = if node.is_root() {
            JCR_ROOT.to_string()
        } else {
            escape_name(node.name())
        };

        write!(self.out, "<{}", element)?;
        if outermost {
            write_namespaces(self.out, self.registry)?;
        }

        for property in node.properties() {
            if property.is_multiple() {
                continue;
            }
            let Some(value) = property.value() else {
                continue;
            };
            let text = if property.property_type().is_binary() {
                if self.options.skip_binary {
                    continue;
                }
                BASE64.encode(value.as_bytes())
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            write!(
                self.out,
                " {}=\"{}\"",
                escape_name(property.name()),
                escape(text.as_str())
            )?;
        }

        let children = if self.options.no_recurse {
            Vec::new()
        } else {
            readable_children(self.source, node).map_err(ExportError::Source)?
        };

        if children.is_empty() {
            self.out.write_all(b"/>")?;
            return Ok(());
        }

        self.out.write_all(b">")?;
        for child in &children {
            self.node(child, false)?;
        }
        write!(self.out, "</{}>", element)?;
        Ok(())
    }
}
