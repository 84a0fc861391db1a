//! Content records: the unit a publisher pushes and the store serves.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{hashes_equal, ContentHash};

/// A published piece of content.
///
/// Identity is by the name it is stored under, not by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Display title.
    pub title: String,
    /// Author-claimed publication instant.
    pub timestamp: DateTime<Utc>,
    /// Body text.
    pub body: String,
}

impl ContentRecord {
    /// Create a new record.
    pub fn new(title: impl Into<String>, timestamp: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            timestamp,
            body: body.into(),
        }
    }

    /// Timestamp rendered the way it is fed to the content hash.
    ///
    /// RFC 3339, UTC, always nine fractional digits.
    pub fn canonical_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Compute the content hash: `BLAKE3(title || body || canonical_timestamp)`.
    pub fn hash(&self) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.title.as_bytes());
        hasher.update(self.body.as_bytes());
        hasher.update(self.canonical_timestamp().as_bytes());
        ContentHash(*hasher.finalize().as_bytes())
    }
}

/// A named record together with the hash the publisher computed over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRecord {
    /// Name the record is stored under.
    pub name: String,
    /// The record itself.
    pub record: ContentRecord,
    /// Hash transmitted alongside the record.
    pub hash: Vec<u8>,
}

impl SignedRecord {
    /// Build a signed record, hashing `record`.
    pub fn new(name: impl Into<String>, record: ContentRecord) -> Self {
        let hash = record.hash().as_bytes().to_vec();
        Self {
            name: name.into(),
            record,
            hash,
        }
    }

    /// Check the transmitted hash against one recomputed from the record.
    pub fn verify(&self) -> bool {
        hashes_equal(self.record.hash().as_bytes(), &self.hash)
    }
}
