//! Errors for execution.

/// A type for execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Column '{0}' is missing from the result row.")]
    MissingColumn(String),
    #[error("Cursor error: {0}")]
    Cursor(String),
    #[error("No entity of '{entity}' matches the given key.")]
    NotFound { entity: String },
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
