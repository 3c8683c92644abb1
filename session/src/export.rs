//! Subtree export through the session's view.

use cairn_core::{Node, Path, Permission};
use cairn_export::{ExportError, NodeSource};
use cairn_object::{ObjectError, ObjectManager};

use crate::SessionError;

/// Feeds the export writers from an object manager, so exports include
/// pending changes.
pub(crate) struct SessionSource<'a> {
    objects: &'a mut ObjectManager,
}

impl<'a> SessionSource<'a> {
    pub(crate) fn new(objects: &'a mut ObjectManager) -> Self {
        Self { objects }
    }
}

impl NodeSource for SessionSource<'_> {
    type Error = ObjectError;

    fn children(&mut self, node: &Node) -> Result<Vec<Node>, ObjectError> {
        self.objects.children(node.path())
    }

    /// Permissions are kept by the repository, so a node is checked at
    /// its remote path, which differs from `path` after local moves.
    fn can_read(&mut self, path: &Path) -> Result<bool, ObjectError> {
        let remote = self.objects.remote_path(path)?;
        Ok(self.objects.permissions(&remote)?.contains(&Permission::Read))
    }
}

impl From<ExportError<ObjectError>> for SessionError {
    fn from(error: ExportError<ObjectError>) -> Self {
        match error {
            ExportError::Io(e) => Self::Io(e),
            ExportError::Source(e) => e.into(),
        }
    }
}
