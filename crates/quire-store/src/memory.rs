//! In-memory implementation of the [`Table`] trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. Writes can be made to
//! fail on demand to exercise persistence error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use quire_core::ContentRecord;

use crate::error::{Result, StoreError};
use crate::traits::Table;

/// In-memory table. Thread-safe via RwLock.
pub struct MemoryTable {
    rows: RwLock<HashMap<String, ContentRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put`/`delete` fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("write rejected".into()));
        }
        Ok(())
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
        StoreError::Persistence(format!("table lock poisoned: {}", e))
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Table for MemoryTable {
    fn put(&self, name: &str, record: &ContentRecord) -> Result<()> {
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        rows.insert(name.to_string(), record.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<ContentRecord>> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        Ok(rows.get(name).cloned())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        self.check_writable()?;
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        Ok(rows.remove(name).is_some())
    }

    fn scan(&self) -> Result<Vec<(String, ContentRecord)>> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        Ok(rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn count(&self) -> Result<usize> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_memory_table_basic() {
        let table = MemoryTable::new();
        let r = ContentRecord::new("t", Utc::now(), "b");

        table.put("a", &r).unwrap();
        assert_eq!(table.get("a").unwrap(), Some(r));
        assert_eq!(table.count().unwrap(), 1);

        assert!(table.delete("a").unwrap());
        assert_eq!(table.count().unwrap(), 0);
    }

    #[test]
    fn test_fail_writes() {
        let table = MemoryTable::new();
        let r = ContentRecord::new("t", Utc::now(), "b");
        table.put("a", &r).unwrap();

        table.set_fail_writes(true);
        assert!(matches!(table.put("b", &r), Err(StoreError::Persistence(_))));
        assert!(matches!(table.delete("a"), Err(StoreError::Persistence(_))));
        assert_eq!(table.get("a").unwrap(), Some(r));

        table.set_fail_writes(false);
        assert!(table.delete("a").unwrap());
    }
}
