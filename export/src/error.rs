//! Export error types.

use thiserror::Error;

/// Export errors, generic over the node source's error.
#[derive(Debug, Error)]
pub enum ExportError<E>
where
    E: std::error::Error + 'static,
{
    /// The output sink failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The node source failed.
    #[error("node source failed: {0}")]
    Source(#[source] E),
}

/// Result type for export operations.
pub type ExportResult<T, E> = Result<T, ExportError<E>>;
