//! Transport error types.

use thiserror::Error;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No item exists at the path, or it is not readable.
    #[error("item not found: {path}")]
    ItemNotFound { path: String },

    /// No readable node carries the identifier.
    #[error("no node with identifier {identifier}")]
    IdentifierNotFound { identifier: String },

    /// An item already exists where one would be created.
    #[error("item exists: {path}")]
    ItemExists { path: String },

    /// A structural or type constraint would be violated.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// A versioning rule would be violated.
    #[error("version error: {message}")]
    Version { message: String },

    /// An item is locked by another session.
    #[error("lock error: {message}")]
    Lock { message: String },

    /// A node is still referenced.
    #[error("referential integrity violation: {message}")]
    ReferentialIntegrity { message: String },

    /// The session lacks the required permission.
    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// The workspace does not exist.
    #[error("no such workspace: {name}")]
    NoSuchWorkspace { name: String },

    /// The login is unknown or has logged out.
    #[error("unknown login: {login}")]
    UnknownLogin { login: String },

    /// The credentials were rejected.
    #[error("login failed for user '{user}'")]
    LoginFailed { user: String },

    /// Transaction primitive misuse or failure.
    #[error("transaction error: {message}")]
    Transaction { message: String },

    /// The remote end failed or could not be reached.
    #[error("repository unavailable: {message}")]
    Unavailable { message: String },
}

impl TransportError {
    pub fn item_not_found(path: impl ToString) -> Self {
        Self::ItemNotFound {
            path: path.to_string(),
        }
    }

    pub fn item_exists(path: impl ToString) -> Self {
        Self::ItemExists {
            path: path.to_string(),
        }
    }

    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    pub fn referential_integrity(message: impl Into<String>) -> Self {
        Self::ReferentialIntegrity {
            message: message.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn unknown_login(login: impl ToString) -> Self {
        Self::UnknownLogin {
            login: login.to_string(),
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns true for the not-found kinds.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound { .. } | Self::IdentifierNotFound { .. }
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
