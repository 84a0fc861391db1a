//! The content store: durable table, in-memory mirror, ordered index.
//!
//! Every operation runs under one mutex that guards the mirror and the
//! index, and durable writes happen inside that critical section. A caller
//! can therefore never observe a mirror update without its index update, and
//! a failed durable write leaves both exactly as they were.
//!
//! Records leave the store by clone only; nothing hands out a reference into
//! the mirror.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use quire_core::ContentRecord;

use crate::error::{Result, StoreError};
use crate::index::{build_index, ordered_snapshot, IndexEntry, SortOrder};
use crate::traits::Table;

/// Coherent cache over a durable [`Table`].
pub struct ContentStore<T: Table> {
    table: T,
    order: SortOrder,
    state: Mutex<StoreState>,
}

struct StoreState {
    /// name -> record, the read path.
    mirror: HashMap<String, ContentRecord>,
    /// Mirror's (name, timestamp) pairs, newest first.
    index: Vec<IndexEntry>,
}

impl StoreState {
    fn reindex(&mut self) {
        self.index = build_index(&self.mirror);
    }
}

impl<T: Table> ContentStore<T> {
    /// Open a store over `table`, loading every stored record into the mirror.
    pub fn open(table: T, order: SortOrder) -> Result<Self> {
        let mirror: HashMap<String, ContentRecord> = table.scan()?.into_iter().collect();
        let index = build_index(&mirror);

        tracing::debug!(records = mirror.len(), "content store opened");

        Ok(Self {
            table,
            order,
            state: Mutex::new(StoreState { mirror, index }),
        })
    }

    /// The underlying durable table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Configured listing order.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Inconsistent(format!("state lock poisoned: {}", e)))
    }

    /// Insert or replace the record under `name`.
    ///
    /// The durable write happens first; on failure the mirror and index are
    /// left untouched.
    pub fn add(&self, name: &str, record: ContentRecord) -> Result<()> {
        let mut state = self.lock()?;

        if let Err(e) = self.table.put(name, &record) {
            tracing::warn!(name, error = %e, "durable write failed");
            return Err(e);
        }

        state.mirror.insert(name.to_string(), record);
        state.reindex();

        tracing::debug!(name, entries = state.index.len(), "record stored");
        Ok(())
    }

    /// Fetch a copy of the record under `name`.
    ///
    /// Served from the mirror when present. On a miss the durable table is
    /// consulted and the mirror populated.
    pub fn get(&self, name: &str) -> Result<ContentRecord> {
        let mut state = self.lock()?;

        if let Some(record) = state.mirror.get(name) {
            return Ok(record.clone());
        }

        match self.table.get(name)? {
            Some(record) => {
                state.mirror.insert(name.to_string(), record.clone());
                state.reindex();
                tracing::debug!(name, "mirror filled from table");
                Ok(record)
            }
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    /// Remove the record under `name`.
    ///
    /// The durable delete happens first; on failure the mirror and index are
    /// left untouched.
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.lock()?;

        let removed = match self.table.delete(name) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(name, error = %e, "durable delete failed");
                return Err(e);
            }
        };

        let cached = state.mirror.remove(name).is_some();
        if !removed && !cached {
            return Err(StoreError::NotFound(name.to_string()));
        }
        state.reindex();

        tracing::debug!(name, entries = state.index.len(), "record deleted");
        Ok(())
    }

    /// The record with the most recent timestamp.
    pub fn latest(&self) -> Result<ContentRecord> {
        let state = self.lock()?;

        let newest = state.index.first().ok_or(StoreError::NoEntries)?;
        state.mirror.get(&newest.name).cloned().ok_or_else(|| {
            StoreError::Inconsistent(format!("index names {:?} but mirror lacks it", newest.name))
        })
    }

    /// Snapshot of the index in the configured order.
    pub fn list(&self) -> Result<Vec<IndexEntry>> {
        let state = self.lock()?;
        Ok(ordered_snapshot(&state.index, self.order))
    }

    /// Number of records in the mirror.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.mirror.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.mirror.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::memory::MemoryTable;
    use crate::sqlite::SqliteTable;
    use chrono::{TimeZone, Utc};

    fn record(title: &str, secs: i64) -> ContentRecord {
        ContentRecord::new(title, Utc.timestamp_opt(secs, 0).unwrap(), format!("{title} body"))
    }

    fn memory_store() -> ContentStore<MemoryTable> {
        ContentStore::open(MemoryTable::new(), SortOrder::NewestFirst).unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = memory_store();
        assert!(matches!(store.latest(), Err(StoreError::NoEntries)));
        assert!(matches!(store.get("anything"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("anything"), Err(StoreError::NotFound(_))));
        assert!(store.list().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_readd_replaces() {
        let store = memory_store();
        let r1 = record("one", 100);
        let r2 = record("two", 200);

        store.add("x", r1).unwrap();
        store.add("x", r2.clone()).unwrap();

        assert_eq!(store.get("x").unwrap(), r2);
        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "x");
        assert_eq!(list[0].timestamp, r2.timestamp);
        assert_eq!(store.table().get("x").unwrap(), Some(r2));
    }

    #[test]
    fn test_latest_follows_deletes() {
        let store = memory_store();
        store.add("a", record("t1", 10)).unwrap();
        store.add("c", record("t3", 30)).unwrap();
        store.add("b", record("t2", 20)).unwrap();

        assert_eq!(store.latest().unwrap().title, "t3");

        store.delete("c").unwrap();
        assert_eq!(store.latest().unwrap().title, "t2");
        assert!(matches!(store.get("c"), Err(StoreError::NotFound(_))));
        assert_eq!(store.table().get("c").unwrap(), None);
    }

    #[test]
    fn test_list_orders() {
        let newest = memory_store();
        let oldest = ContentStore::open(MemoryTable::new(), SortOrder::OldestFirst).unwrap();
        for store_add in [
            ("a", record("a", 10)),
            ("b", record("b", 30)),
            ("c", record("c", 20)),
        ] {
            newest.add(store_add.0, store_add.1.clone()).unwrap();
            oldest.add(store_add.0, store_add.1).unwrap();
        }

        let names = |v: Vec<IndexEntry>| v.into_iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(names(newest.list().unwrap()), vec!["b", "c", "a"]);
        assert_eq!(names(oldest.list().unwrap()), vec!["a", "c", "b"]);

        // latest is newest regardless of listing order
        assert_eq!(oldest.latest().unwrap().title, "b");
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = memory_store();
        store.add("a", record("a", 10)).unwrap();

        let mut snapshot = store.list().unwrap();
        snapshot.clear();
        store.add("b", record("b", 20)).unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_get_returns_copy() {
        let store = memory_store();
        store.add("a", record("a", 10)).unwrap();

        let mut copy = store.get("a").unwrap();
        copy.title = "changed".into();

        assert_eq!(store.get("a").unwrap().title, "a");
    }

    #[test]
    fn test_failed_add_leaves_state() {
        let store = memory_store();
        store.add("a", record("a", 10)).unwrap();

        store.table().set_fail_writes(true);
        let err = store.add("b", record("b", 20)).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        let err = store.add("a", record("replaced", 99)).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));

        assert!(matches!(store.get("b"), Err(StoreError::NotFound(_))));
        assert_eq!(store.get("a").unwrap().title, "a");
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.latest().unwrap().title, "a");

        store.table().set_fail_writes(false);
        store.add("b", record("b", 20)).unwrap();
        assert_eq!(store.latest().unwrap().title, "b");
    }

    #[test]
    fn test_failed_delete_leaves_state() {
        let store = memory_store();
        store.add("a", record("a", 10)).unwrap();

        store.table().set_fail_writes(true);
        assert!(matches!(store.delete("a"), Err(StoreError::Persistence(_))));

        assert_eq!(store.get("a").unwrap().title, "a");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_get_miss_fills_mirror() {
        let store = memory_store();
        // Written behind the store's back.
        store.table().put("late", &record("late", 50)).unwrap();

        assert_eq!(store.get("late").unwrap().title, "late");
        assert_eq!(store.list().unwrap()[0].name, "late");
        assert_eq!(store.latest().unwrap().title, "late");
    }

    #[test]
    fn test_reopen_warms_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.db");

        {
            let store = ContentStore::open(SqliteTable::open(&path).unwrap(), SortOrder::default())
                .unwrap();
            store.add("first", record("first", 1)).unwrap();
            store.add("second", record("second", 2)).unwrap();
        }

        let store =
            ContentStore::open(SqliteTable::open(&path).unwrap(), SortOrder::default()).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.latest().unwrap().title, "second");
    }

    #[test]
    fn test_concurrent_adds_stay_coherent() {
        let store = Arc::new(memory_store());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("t{t}-{i}");
                        store.add(&name, record(&name, t * 1000 + i)).unwrap();
                        let list = store.list().unwrap();
                        assert!(list.iter().any(|e| e.name == name));
                        assert!(list.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let list = store.list().unwrap();
        assert_eq!(list.len(), 400);
        assert_eq!(store.table().count().unwrap(), 400);
        assert!(list.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(store.latest().unwrap().title, "t7-49");
    }
}
