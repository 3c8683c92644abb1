//! Binary values loaded on demand.

use cairn_core::Path;

use crate::{SessionError, SessionKey, SessionRegistry, SessionResult};

/// A handle to one value of a binary property.
///
/// The bytes are read from the repository when [`load`](Self::load) is
/// called, through the session that created the handle. They reflect the
/// saved state of the property, not pending changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyBinary {
    key: SessionKey,
    path: Path,
    index: usize,
}

impl LazyBinary {
    pub(crate) fn new(key: SessionKey, path: Path, index: usize) -> Self {
        Self { key, path, index }
    }

    /// Key of the owning session.
    pub fn session_key(&self) -> SessionKey {
        self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Position of the value within the property.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read the bytes. Fails with `NotLive` once the owning session has
    /// logged out.
    pub fn load(&self, registry: &SessionRegistry) -> SessionResult<Vec<u8>> {
        let context = registry.lookup(self.key).ok_or(SessionError::NotLive)?;
        Ok(context
            .transport
            .binary(context.login, &self.path, self.index)?)
    }
}
