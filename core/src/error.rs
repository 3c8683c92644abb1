//! Common error types for Cairn.

use thiserror::Error;

/// Errors raised while parsing or manipulating paths and names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path does not start with `/`.
    #[error("path is not absolute: {path}")]
    NotAbsolute { path: String },

    /// A segment between two slashes is empty.
    #[error("empty path segment in {path}")]
    EmptySegment { path: String },

    /// `.` and `..` are not accepted in repository paths.
    #[error("relative segment '{segment}' in {path}")]
    RelativeSegment { path: String, segment: String },

    /// A same-name-sibling index is not a positive integer.
    #[error("invalid same-name-sibling index in segment '{segment}'")]
    InvalidIndex { segment: String },

    /// A name contains a character that is not allowed.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The operation is not defined for the root path.
    #[error("operation not allowed on the root path")]
    Root,
}

impl PathError {
    pub fn not_absolute(path: impl Into<String>) -> Self {
        Self::NotAbsolute { path: path.into() }
    }

    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }
}

/// Result type for path operations.
pub type PathResult<T> = Result<T, PathError>;
