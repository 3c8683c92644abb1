//! Session error types.
//!
//! Collaborator errors are flattened into one taxonomy so callers can match
//! on the kind of failure without knowing which layer produced it. Every
//! "no such item" signal from a lookup becomes [`SessionError::PathNotFound`].

use cairn_core::PathError;
use cairn_object::ObjectError;
use cairn_registry::RegistryError;
use cairn_transaction::TransactionError;
use cairn_transport::TransportError;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No item at the path.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// No node carries the identifier.
    #[error("no node with identifier {identifier}")]
    IdentifierNotFound { identifier: String },

    /// An item already exists at the target path.
    #[error("item already exists: {path}")]
    ItemExists { path: String },

    /// The change breaks a repository rule.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("version error: {message}")]
    Version { message: String },

    #[error("lock error: {message}")]
    Lock { message: String },

    /// A referenced node would be removed.
    #[error("referential integrity violation: {message}")]
    ReferentialIntegrity { message: String },

    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// The repository does not offer this operation.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },

    /// The operation exists but this client does not implement it.
    #[error("not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    /// The session was logged out.
    #[error("session is not live")]
    NotLive,

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// A malformed argument other than a path.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("namespace error: {0}")]
    Namespace(#[from] RegistryError),

    #[error("transaction error: {0}")]
    Transaction(TransactionError),

    /// The repository failed for a reason not covered above.
    #[error("repository error: {message}")]
    Repository { message: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl SessionError {
    pub fn path_not_found(path: impl ToString) -> Self {
        Self::PathNotFound {
            path: path.to_string(),
        }
    }

    pub fn item_exists(path: impl ToString) -> Self {
        Self::ItemExists {
            path: path.to_string(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a not-found error for a path.
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

impl From<TransportError> for SessionError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::ItemNotFound { path } => Self::PathNotFound { path },
            TransportError::IdentifierNotFound { identifier } => {
                Self::IdentifierNotFound { identifier }
            }
            TransportError::ItemExists { path } => Self::ItemExists { path },
            TransportError::ConstraintViolation { message } => {
                Self::ConstraintViolation { message }
            }
            TransportError::Version { message } => Self::Version { message },
            TransportError::Lock { message } => Self::Lock { message },
            TransportError::ReferentialIntegrity { message } => {
                Self::ReferentialIntegrity { message }
            }
            TransportError::AccessDenied { message } => Self::AccessDenied { message },
            TransportError::LoginFailed { user } => {
                Self::access_denied(format!("login failed for user '{}'", user))
            }
            e @ TransportError::Transaction { .. } => {
                Self::Transaction(TransactionError::Transport(e))
            }
            e @ (TransportError::NoSuchWorkspace { .. }
            | TransportError::UnknownLogin { .. }
            | TransportError::Unavailable { .. }) => {
                Self::repository(e.to_string())
            }
        }
    }
}

impl From<ObjectError> for SessionError {
    fn from(error: ObjectError) -> Self {
        match error {
            ObjectError::ItemNotFound { path } => Self::PathNotFound { path },
            ObjectError::IdentifierNotFound { identifier } => {
                Self::IdentifierNotFound { identifier }
            }
            ObjectError::ItemExists { path } => Self::ItemExists { path },
            ObjectError::ConstraintViolation { message } => Self::ConstraintViolation { message },
            ObjectError::InvalidPath(e) => Self::InvalidPath(e),
            ObjectError::Internal { message } => Self::Repository { message },
            ObjectError::Transport(e) => e.into(),
        }
    }
}

impl From<TransactionError> for SessionError {
    fn from(error: TransactionError) -> Self {
        match error {
            TransactionError::Transport(e) => Self::from(e),
            other => Self::Transaction(other),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
