//! Encrypted record envelope.
//!
//! A [`SignedRecord`] is canonically encoded and encrypted with AES-256-CFB
//! under a key stretched from the server challenge and the shared secret.
//! CFB carries no authentication tag; integrity comes from the content hash
//! inside the plaintext, which is recomputed and compared on every open.

use std::io::{Read, Write};

use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::canonical::{decode_signed, encode_signed};
use crate::crypto::{derive_key, DerivedKey};
use crate::error::{CoreError, Result};
use crate::record::{ContentRecord, SignedRecord};

/// IV length: one AES block.
pub const IV_LEN: usize = 16;

type Aes256CfbEnc = cfb_mode::Encryptor<aes::Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<aes::Aes256>;

/// The encrypted form of a signed record. Opaque without the derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Random per-envelope IV.
    pub iv: [u8; IV_LEN],
    /// AES-256-CFB ciphertext of the canonical signed record.
    pub ciphertext: Vec<u8>,
}

/// JSON shape of an envelope: `{"IV": base64, "Content": base64}`.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "IV")]
    iv: String,
    #[serde(rename = "Content")]
    content: String,
}

impl Envelope {
    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.to_wire()).map_err(|e| CoreError::Wire(e.to_string()))
    }

    /// Parse the JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let wire: WireEnvelope =
            serde_json::from_slice(bytes).map_err(|e| CoreError::Wire(e.to_string()))?;
        Self::from_wire(wire)
    }

    fn to_wire(&self) -> WireEnvelope {
        WireEnvelope {
            iv: STANDARD.encode(self.iv),
            content: STANDARD.encode(&self.ciphertext),
        }
    }

    fn from_wire(wire: WireEnvelope) -> Result<Self> {
        let iv_bytes = STANDARD
            .decode(wire.iv.as_bytes())
            .map_err(|e| CoreError::Wire(format!("IV: {e}")))?;
        let iv: [u8; IV_LEN] = iv_bytes
            .try_into()
            .map_err(|_| CoreError::Wire(format!("IV must be {IV_LEN} bytes")))?;
        let ciphertext = STANDARD
            .decode(wire.content.as_bytes())
            .map_err(|e| CoreError::Wire(format!("Content: {e}")))?;
        Ok(Self { iv, ciphertext })
    }
}

/// Hash, encode, and encrypt `record` under the key for `(seed, secret)`.
pub fn encode(seed: i64, secret: &[u8], record: &ContentRecord, name: &str) -> Result<Envelope> {
    let key = derive_key(seed, secret);

    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CoreError::Entropy(e.to_string()))?;

    let signed = SignedRecord::new(name, record.clone());
    let mut buf = encode_signed(&signed);
    encryptor(&key, &iv)?.encrypt(&mut buf);

    Ok(Envelope {
        iv,
        ciphertext: buf,
    })
}

/// Decrypt, decode, and verify an envelope.
///
/// Fails with [`CoreError::Decode`] if the plaintext is not a signed record
/// and [`CoreError::InvalidHash`] if the carried hash does not match.
pub fn decode(envelope: &Envelope, seed: i64, secret: &[u8]) -> Result<SignedRecord> {
    let key = derive_key(seed, secret);

    let mut buf = envelope.ciphertext.clone();
    decryptor(&key, &envelope.iv)?.decrypt(&mut buf);

    let signed = decode_signed(&buf)?;
    if !signed.verify() {
        return Err(CoreError::InvalidHash);
    }
    Ok(signed)
}

/// Encode `record` and write its JSON envelope to `writer`.
pub fn write_envelope<W: Write>(
    writer: W,
    record: &ContentRecord,
    name: &str,
    seed: i64,
    secret: &[u8],
) -> Result<()> {
    let envelope = encode(seed, secret, record, name)?;
    serde_json::to_writer(writer, &envelope.to_wire()).map_err(|e| CoreError::Wire(e.to_string()))
}

/// Read a JSON envelope from `reader` and open it.
pub fn read_envelope<R: Read>(reader: R, seed: i64, secret: &[u8]) -> Result<SignedRecord> {
    let wire: WireEnvelope =
        serde_json::from_reader(reader).map_err(|e| CoreError::Wire(e.to_string()))?;
    let envelope = Envelope::from_wire(wire)?;
    decode(&envelope, seed, secret)
}

fn encryptor(key: &DerivedKey, iv: &[u8]) -> Result<Aes256CfbEnc> {
    Aes256CfbEnc::new_from_slices(key.as_bytes(), iv).map_err(|e| CoreError::Crypto(e.to_string()))
}

fn decryptor(key: &DerivedKey, iv: &[u8]) -> Result<Aes256CfbDec> {
    Aes256CfbDec::new_from_slices(key.as_bytes(), iv).map_err(|e| CoreError::Crypto(e.to_string()))
}
