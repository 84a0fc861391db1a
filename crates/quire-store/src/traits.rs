//! Table trait: the durable key/value interface beneath the content store.
//!
//! This trait keeps [`ContentStore`](crate::ContentStore) storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use quire_core::ContentRecord;

use crate::error::Result;

/// Durable `name -> ContentRecord` table.
///
/// Every method is synchronous and either completes or leaves the table
/// unchanged. Callers serialize access; implementations only need to be
/// safe to share, not to order concurrent writers.
pub trait Table: Send + Sync {
    /// Insert or replace the record stored under `name`.
    fn put(&self, name: &str, record: &ContentRecord) -> Result<()>;

    /// Fetch the record stored under `name`.
    fn get(&self, name: &str) -> Result<Option<ContentRecord>>;

    /// Remove the record under `name`.
    ///
    /// Returns `true` if a row was removed.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Load every `(name, record)` pair, in no particular order.
    fn scan(&self) -> Result<Vec<(String, ContentRecord)>>;

    /// Count of stored records.
    fn count(&self) -> Result<usize>;
}
