//! Error types for Quire Core.

use thiserror::Error;

/// Errors raised while deriving keys, encoding records, or opening envelopes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cipher could not be keyed (bad key or IV length).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The serialized payload is malformed.
    #[error("decoding error: {0}")]
    Decode(String),

    /// The recomputed content hash does not match the transmitted one.
    #[error("invalid content hash")]
    InvalidHash,

    /// The OS entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// The JSON wire form could not be written or read.
    #[error("wire format error: {0}")]
    Wire(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
