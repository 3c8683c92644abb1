//! Object manager error types.

use cairn_core::PathError;
use cairn_transport::TransportError;
use thiserror::Error;

/// Object manager errors.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// No item at the path in the session's view.
    #[error("item not found: {path}")]
    ItemNotFound { path: String },

    /// No node carries the identifier.
    #[error("no node with identifier {identifier}")]
    IdentifierNotFound { identifier: String },

    /// An item already exists where one was to be created.
    #[error("item already exists: {path}")]
    ItemExists { path: String },

    /// The change would break a repository rule.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// A malformed path or name.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The cache lost track of one of its own entries.
    #[error("cache inconsistency: {message}")]
    Internal { message: String },

    /// The remote repository failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ObjectError {
    pub fn item_not_found(path: impl ToString) -> Self {
        Self::ItemNotFound {
            path: path.to_string(),
        }
    }

    pub fn identifier_not_found(identifier: impl Into<String>) -> Self {
        Self::IdentifierNotFound {
            identifier: identifier.into(),
        }
    }

    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error means the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ObjectError::ItemNotFound { .. } | ObjectError::IdentifierNotFound { .. } => true,
            ObjectError::Transport(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for object manager operations.
pub type ObjectResult<T> = Result<T, ObjectError>;
