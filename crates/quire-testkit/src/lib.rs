//! # Quire Testkit
//!
//! Testing utilities for Quire.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a publisher secret and seed, sample records, and stores
//!   ready for use
//! - **Generators**: Proptest strategies for records, names, secrets, and seeds
//!
//! ## Test Fixtures
//!
//! ```rust
//! use quire_testkit::fixtures::{record_at, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let envelope = fixture.seal("hello", &record_at("Hello", 1_700_000_000));
//! let signed = fixture.open(&envelope).unwrap();
//! assert_eq!(signed.name, "hello");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use quire_testkit::generators::content_record;
//!
//! proptest! {
//!     #[test]
//!     fn hash_is_deterministic(record in content_record()) {
//!         prop_assert_eq!(record.hash(), record.clone().hash());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    memory_store, record_at, sample_records, temp_sqlite_store, TestFixture, SECRET_LEN,
};
pub use generators::{content_record, record_name, secret, seed, timestamp};
