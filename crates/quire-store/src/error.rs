//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The durable table could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A stored record could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No record under this name.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store holds no records.
    #[error("no entries")]
    NoEntries,

    /// Index and mirror disagree. Indicates a bug, not bad input.
    #[error("store inconsistent: {0}")]
    Inconsistent(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Persistence(e.to_string())
    }
}

impl From<quire_core::CoreError> for StoreError {
    fn from(e: quire_core::CoreError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
