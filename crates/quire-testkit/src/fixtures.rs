//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use tempfile::TempDir;

use quire_core::{envelope, ContentRecord, Envelope, SignedRecord};
use quire_store::{ContentStore, MemoryTable, SortOrder, SqliteTable};

/// Length of the secret in the reference publishing scenario.
pub const SECRET_LEN: usize = 1025;

/// A publisher's view of the world: the shared secret and a challenge seed.
pub struct TestFixture {
    pub secret: Vec<u8>,
    pub seed: i64,
}

impl TestFixture {
    /// Random 1025-byte secret and a random positive seed.
    pub fn new() -> Self {
        let mut secret = vec![0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self {
            secret,
            seed: OsRng.gen_range(1..=i64::MAX),
        }
    }

    /// Deterministic fixture.
    pub fn with_secret(secret: impl Into<Vec<u8>>, seed: i64) -> Self {
        Self {
            secret: secret.into(),
            seed,
        }
    }

    /// Same secret, different seed.
    pub fn reseeded(&self, seed: i64) -> Self {
        Self::with_secret(self.secret.clone(), seed)
    }

    /// Encrypt `record` under `name` for the fixture's seed.
    pub fn seal(&self, name: &str, record: &ContentRecord) -> Envelope {
        envelope::encode(self.seed, &self.secret, record, name).expect("encode envelope")
    }

    /// Decrypt an envelope with the fixture's seed and secret.
    pub fn open(&self, envelope: &Envelope) -> quire_core::Result<SignedRecord> {
        envelope::decode(envelope, self.seed, &self.secret)
    }

    /// Write the secret to `dir/passfile` and return its path.
    pub fn write_passfile(&self, dir: &Path) -> PathBuf {
        let path = dir.join("passfile");
        fs::write(&path, &self.secret).expect("write passfile");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Record titled `title` stamped `secs` after the epoch, with a derived body.
pub fn record_at(title: &str, secs: i64) -> ContentRecord {
    let ts = Utc.timestamp_opt(secs, 0).single().expect("valid timestamp");
    ContentRecord::new(title, ts, format!("<p>{title}</p>"))
}

/// Three named records with strictly increasing timestamps t1 < t2 < t3.
pub fn sample_records() -> Vec<(String, ContentRecord)> {
    vec![
        ("first".to_string(), record_at("t1", 1_600_000_000)),
        ("second".to_string(), record_at("t2", 1_650_000_000)),
        ("third".to_string(), record_at("t3", 1_700_000_000)),
    ]
}

/// Empty in-memory store.
pub fn memory_store(order: SortOrder) -> ContentStore<MemoryTable> {
    ContentStore::open(MemoryTable::new(), order).expect("open memory store")
}

/// Empty SQLite store in a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_sqlite_store(order: SortOrder) -> (TempDir, PathBuf, ContentStore<SqliteTable>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("posts.db");
    let table = SqliteTable::open(&path).expect("open sqlite table");
    let store = ContentStore::open(table, order).expect("open sqlite store");
    (dir, path, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_seal_and_open() {
        let fixture = TestFixture::new();
        assert_eq!(fixture.secret.len(), SECRET_LEN);
        assert!(fixture.seed > 0);

        let record = record_at("Hello", 1_700_000_000);
        let signed = fixture.open(&fixture.seal("hello", &record)).unwrap();
        assert_eq!(signed.name, "hello");
        assert_eq!(signed.record, record);
    }

    #[test]
    fn test_reseeded_fixture_cannot_open() {
        let fixture = TestFixture::with_secret(vec![7u8; 64], 42);
        let envelope = fixture.seal("x", &record_at("x", 1));
        assert!(fixture.reseeded(43).open(&envelope).is_err());
    }

    #[test]
    fn test_sample_records_are_ordered() {
        let records = sample_records();
        assert!(records
            .windows(2)
            .all(|w| w[0].1.timestamp < w[1].1.timestamp));
    }

    #[test]
    fn test_stores_start_empty() {
        assert!(memory_store(SortOrder::default()).is_empty().unwrap());

        let (_dir, path, store) = temp_sqlite_store(SortOrder::default());
        assert!(store.is_empty().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_write_passfile() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = TestFixture::new();
        let path = fixture.write_passfile(dir.path());
        assert_eq!(fs::read(path).unwrap(), fixture.secret);
    }
}
