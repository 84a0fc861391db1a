//! Cryptographic primitives for Quire.
//!
//! Wraps BLAKE3 hashing and the challenge key stretch with strong types.
//!
//! # Key stretching
//!
//! [`derive_key`] is a deliberately cheap work-factor increase over a single
//! hash: eight rounds of BLAKE3 over `seed || secret || seed`. It is not a
//! vetted password KDF (no salt, no memory hardness). It relies on the shared
//! secret being long and random, and on the seed being a fresh server
//! challenge.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Total number of hash rounds applied by [`derive_key`].
pub const STRETCH_ROUNDS: usize = 8;

/// Length of a derived key in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte BLAKE3 digest over a content record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub(crate) [u8; 32]);

impl ContentHash {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

/// A symmetric key stretched from a challenge and the shared secret.
///
/// Zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Stretch `(seed, secret)` into a 256-bit key.
///
/// The first round hashes the little-endian seed, the secret, then the seed
/// again. The remaining seven rounds each hash the previous digest alone.
pub fn derive_key(seed: i64, secret: &[u8]) -> DerivedKey {
    let seed_le = seed.to_le_bytes();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed_le);
    hasher.update(secret);
    hasher.update(&seed_le);
    let mut digest: [u8; KEY_LEN] = *hasher.finalize().as_bytes();

    for _ in 1..STRETCH_ROUNDS {
        let next = *blake3::hash(&digest).as_bytes();
        digest.zeroize();
        digest = next;
    }

    DerivedKey(digest)
}

/// Compare two hashes without leaking where they differ.
///
/// Empty or unequal-length inputs never match.
pub fn hashes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
