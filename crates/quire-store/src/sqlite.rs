//! SQLite implementation of the [`Table`] trait.
//!
//! This is the durable backend for Quire. It uses rusqlite with bundled
//! SQLite; the database file lock keeps other processes from writing
//! concurrently, and the connection mutex does the same within this one.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use quire_core::{decode_record, encode_record, ContentRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Table;

/// SQLite-backed record table.
pub struct SqliteTable {
    /// The SQLite connection, protected by a mutex.
    conn: Mutex<Connection>,
}

impl SqliteTable {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Persistence(format!("connection mutex poisoned: {}", e)))?;
        f(&conn)
    }
}

fn decode_row(name: &str, bytes: &[u8]) -> Result<ContentRecord> {
    decode_record(bytes)
        .map_err(|e| StoreError::Serialization(format!("record {:?}: {}", name, e)))
}

impl Table for SqliteTable {
    fn put(&self, name: &str, record: &ContentRecord) -> Result<()> {
        let bytes = encode_record(record);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO records (name, record, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET record = excluded.record,
                                                 updated_at = excluded.updated_at",
                params![name, bytes, chrono::Utc::now().timestamp_millis()],
            )?;
            Ok(())
        })
    }

    fn get(&self, name: &str) -> Result<Option<ContentRecord>> {
        let bytes: Option<Vec<u8>> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT record FROM records WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        bytes.map(|b| decode_row(name, &b)).transpose()
    }

    fn delete(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM records WHERE name = ?1", params![name])?;
            Ok(removed > 0)
        })
    }

    fn scan(&self) -> Result<Vec<(String, ContentRecord)>> {
        let rows: Vec<(String, Vec<u8>)> = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name, record FROM records")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(name, bytes)| {
                let record = decode_row(&name, &bytes)?;
                Ok((name, record))
            })
            .collect()
    }

    fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(title: &str, secs: i64) -> ContentRecord {
        ContentRecord::new(title, Utc.timestamp_opt(secs, 0).unwrap(), format!("{title} body"))
    }

    #[test]
    fn test_put_and_get() {
        let table = SqliteTable::open_memory().unwrap();
        let r = record("first", 1_700_000_000);

        table.put("first", &r).unwrap();
        assert_eq!(table.get("first").unwrap(), Some(r));
        assert_eq!(table.get("missing").unwrap(), None);
    }

    #[test]
    fn test_put_replaces() {
        let table = SqliteTable::open_memory().unwrap();
        table.put("x", &record("old", 1)).unwrap();
        table.put("x", &record("new", 2)).unwrap();

        assert_eq!(table.count().unwrap(), 1);
        assert_eq!(table.get("x").unwrap().unwrap().title, "new");
    }

    #[test]
    fn test_delete() {
        let table = SqliteTable::open_memory().unwrap();
        table.put("x", &record("x", 1)).unwrap();

        assert!(table.delete("x").unwrap());
        assert!(!table.delete("x").unwrap());
        assert_eq!(table.get("x").unwrap(), None);
    }

    #[test]
    fn test_scan() {
        let table = SqliteTable::open_memory().unwrap();
        table.put("a", &record("a", 1)).unwrap();
        table.put("b", &record("b", 2)).unwrap();

        let mut names: Vec<String> = table.scan().unwrap().into_iter().map(|(n, _)| n).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");

        {
            let table = SqliteTable::open(&path).unwrap();
            table.put("kept", &record("kept", 42)).unwrap();
        }

        let table = SqliteTable::open(&path).unwrap();
        assert_eq!(table.get("kept").unwrap().unwrap().title, "kept");
    }

    #[test]
    fn test_corrupt_row_is_serialization_error() {
        let table = SqliteTable::open_memory().unwrap();
        table
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO records (name, record, updated_at) VALUES ('bad', x'ff00', 0)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        assert!(matches!(table.get("bad"), Err(StoreError::Serialization(_))));
        assert!(matches!(table.scan(), Err(StoreError::Serialization(_))));
    }
}
