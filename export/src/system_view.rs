//! System view export.
//!
//! Every node becomes an `sv:node` element and every property an
//! `sv:property` element carrying its declared type, so the output records
//! the full state of the subtree.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cairn_core::names::{is_protected_property, JCR_MIXIN_TYPES, JCR_PRIMARY_TYPE, JCR_ROOT, JCR_UUID};
use cairn_core::{Node, Property};
use cairn_registry::NamespaceRegistry;
use quick_xml::escape::escape;

use crate::{readable_children, write_namespaces, ExportError, ExportOptions, ExportResult, NodeSource, XML_DECLARATION};

/// Write the system view of the subtree rooted at `root` to `out`.
///
/// Namespace declarations go on the outermost element only. Properties are
/// written as `jcr:primaryType`, `jcr:mixinTypes` (if any mixins),
/// `jcr:uuid` (if referenceable), then the rest in node order.
pub fn export_system_view<S, W>(
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
    let mut writer = SystemViewWriter {
        registry,
        source,
        options,
        out,
    };
    writer.node(root, true)
}

struct SystemViewWriter<'a, S, W> {
    registry: &'a NamespaceRegistry,
    source: &'a mut S,
    options: ExportOptions,
    out: &'a mut W,
}

impl<S: NodeSource, W: Write> SystemViewWriter<'_, S, W> {
    fn node(&mut self, node: &Node, outermost: bool) -> ExportResult<(), S::Error> {
        let name = if node.is_root() { JCR_ROOT } else { node.name() };

        self.out.write_all(b"<sv:node")?;
        if outermost {
            write_namespaces(self.out, self.registry)?;
        }
        write!(self.out, " sv:name=\"{}\">", escape(name))?;

        for property in ordered_properties(node) {
            self.property(property)?;
        }

        if !self.options.no_recurse {
            let children = readable_children(self.source, node).map_err(ExportError::Source)?;
            for child in &children {
                self.node(child, false)?;
            }
        }

        self.out.write_all(b"</sv:node>")?;
        Ok(())
    }

    fn property(&mut self, property: &Property) -> ExportResult<(), S::Error> {
        write!(
            self.out,
            "<sv:property sv:name=\"{}\" sv:type=\"{}\"",
            escape(property.name()),
            property.property_type().name()
        )?;
        if property.is_multiple() {
            self.out.write_all(b" sv:multiple=\"true\"")?;
        }
        self.out.write_all(b">")?;

        let binary = property.property_type().is_binary();
        for value in property.values() {
            self.out.write_all(b"<sv:value>")?;
            if binary {
                if !self.options.skip_binary {
                    self.out.write_all(BASE64.encode(value.as_bytes()).as_bytes())?;
                }
            } else {
                let text = String::from_utf8_lossy(value.as_bytes());
                self.out.write_all(escape(&*text).as_bytes())?;
            }
            self.out.write_all(b"</sv:value>")?;
        }

        self.out.write_all(b"</sv:property>")?;
        Ok(())
    }
}

/// Repository-managed properties first, then the stored ones.
fn ordered_properties(node: &Node) -> Vec<&Property> {
    let mut ordered: Vec<&Property> = Vec::with_capacity(node.properties().len());
    ordered.extend(node.property(JCR_PRIMARY_TYPE));
    ordered.extend(node.property(JCR_MIXIN_TYPES));
    if node.is_referenceable() {
        ordered.extend(node.property(JCR_UUID));
    }
    ordered.extend(
        node.properties()
            .iter()
            .filter(|p| !is_protected_property(p.name())),
    );
    ordered
}
