//! # Quire Core
//!
//! Pure primitives for Quire: challenge key derivation, content records,
//! canonical encoding, and encrypted envelopes.
//!
//! This crate contains no storage and no networking. It is pure computation
//! over records and byte buffers.
//!
//! ## Key Types
//!
//! - [`ContentRecord`] - A titled, timestamped body of content
//! - [`SignedRecord`] - A named record plus the hash computed over it
//! - [`Envelope`] - The encrypted wire form of a signed record
//! - [`DerivedKey`] - Key stretched from a challenge and the shared secret
//!
//! ## Protocol
//!
//! ```rust
//! use chrono::Utc;
//! use quire_core::{envelope, ContentRecord};
//!
//! let secret = b"a long shared secret loaded from disk";
//! let seed = 0x1d2c_3b4a_5968_7786; // issued by the server
//!
//! let record = ContentRecord::new("Hello", Utc::now(), "First post");
//! let sealed = envelope::encode(seed, secret, &record, "hello").unwrap();
//! let opened = envelope::decode(&sealed, seed, secret).unwrap();
//!
//! assert_eq!(opened.name, "hello");
//! assert_eq!(opened.record, record);
//! ```
//!
//! ## Canonicalization
//!
//! Records are encoded as deterministic CBOR. See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod record;

pub use canonical::{decode_record, decode_signed, encode_record, encode_signed};
pub use crypto::{derive_key, hashes_equal, ContentHash, DerivedKey};
pub use envelope::Envelope;
pub use error::{CoreError, Result};
pub use record::{ContentRecord, SignedRecord};
