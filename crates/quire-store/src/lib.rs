//! # Quire Store
//!
//! Storage for published records. A durable `name -> record` table sits
//! behind an in-memory mirror and a timestamp-ordered index that answer
//! "latest" and "list" queries.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The coherent cache; the only writer of its state
//! - [`Table`] - The durable key/value interface
//! - [`SqliteTable`] - SQLite-based persistent table
//! - [`MemoryTable`] - In-memory table for tests
//! - [`IndexEntry`] - One `(name, timestamp)` row of the ordered index
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use quire_core::ContentRecord;
//! use quire_store::{ContentStore, SortOrder, SqliteTable};
//!
//! let table = SqliteTable::open("posts.db").unwrap();
//! let store = ContentStore::open(table, SortOrder::NewestFirst).unwrap();
//!
//! store.add("hello", ContentRecord::new("Hello", Utc::now(), "...")).unwrap();
//! let newest = store.latest().unwrap();
//! let names = store.list().unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **Write-through**: the table is written before the mirror, so a failed
//!   write leaves nothing to roll back
//! - **Full reindex**: every mutation rebuilds the index from the mirror
//! - **Copy out**: readers get clones, never references into the mirror

pub mod content;
pub mod error;
pub mod index;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use content::ContentStore;
pub use error::{Result, StoreError};
pub use index::{IndexEntry, SortOrder};
pub use memory::MemoryTable;
pub use sqlite::SqliteTable;
pub use traits::Table;
