//! Well-known names used across Cairn components.
//!
//! These constants ensure consistent naming between the session, the object
//! manager and the export codecs.

/// Property holding the primary node type.
pub const JCR_PRIMARY_TYPE: &str = "jcr:primaryType";

/// Property holding the mixin node types.
pub const JCR_MIXIN_TYPES: &str = "jcr:mixinTypes";

/// Property holding the identifier of a referenceable node.
pub const JCR_UUID: &str = "jcr:uuid";

/// Name used for the root node in serialized output.
pub const JCR_ROOT: &str = "jcr:root";

/// Mixin type marking a node as referenceable.
pub const MIX_REFERENCEABLE: &str = "mix:referenceable";

/// Default primary type of the root node and of nodes created without one.
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";

/// Primary type of the repository root node.
pub const REP_ROOT: &str = "rep:root";

/// Properties managed by the repository itself; they cannot be set or
/// removed directly.
pub const PROTECTED_PROPERTIES: [&str; 3] = [JCR_PRIMARY_TYPE, JCR_MIXIN_TYPES, JCR_UUID];

/// Returns true if `name` is a protected property name.
pub fn is_protected_property(name: &str) -> bool {
    PROTECTED_PROPERTIES.contains(&name)
}
