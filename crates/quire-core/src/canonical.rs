//! Canonical CBOR encoding for records.
//!
//! This module implements RFC 8949 Core Deterministic Encoding for the two
//! shapes Quire ever serializes:
//! - Map keys are small unsigned integers written in ascending order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are whole seconds plus nanoseconds)
//!
//! The same bytes are encrypted inside an envelope and written to the
//! persistent table, so one definition serves both paths.
//!
//! Decoding is total: any input yields a value or [`CoreError::Decode`].
//! Length headers are never used to pre-allocate, so a forged length cannot
//! read or reserve past the end of the buffer.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use ciborium::value::Value;

use crate::error::{CoreError, Result};
use crate::record::{ContentRecord, SignedRecord};

/// Current format version, written as key 0 of every map.
pub const FORMAT_VERSION: u64 = 1;

/// ContentRecord map keys.
mod record_keys {
    pub const VERSION: u64 = 0;
    pub const TITLE: u64 = 1;
    pub const SECONDS: u64 = 2;
    pub const NANOS: u64 = 3;
    pub const BODY: u64 = 4;
    pub const COUNT: usize = 5;
}

/// SignedRecord map keys.
mod signed_keys {
    pub const VERSION: u64 = 0;
    pub const NAME: u64 = 1;
    pub const RECORD: u64 = 2;
    pub const HASH: u64 = 3;
    pub const COUNT: usize = 4;
}

/// Encode a content record to canonical bytes.
pub fn encode_record(record: &ContentRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(record.title.len() + record.body.len() + 32);
    write_record(&mut buf, record);
    buf
}

/// Encode a signed record to canonical bytes.
pub fn encode_signed(signed: &SignedRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        signed.name.len() + signed.record.title.len() + signed.record.body.len() + 80,
    );
    encode_uint(&mut buf, 5, signed_keys::COUNT as u64);

    encode_uint(&mut buf, 0, signed_keys::VERSION);
    encode_uint(&mut buf, 0, FORMAT_VERSION);

    encode_uint(&mut buf, 0, signed_keys::NAME);
    encode_text(&mut buf, &signed.name);

    encode_uint(&mut buf, 0, signed_keys::RECORD);
    write_record(&mut buf, &signed.record);

    encode_uint(&mut buf, 0, signed_keys::HASH);
    encode_bytes(&mut buf, &signed.hash);

    buf
}

/// Decode a content record from canonical bytes.
pub fn decode_record(bytes: &[u8]) -> Result<ContentRecord> {
    let value = read_single_value(bytes)?;
    value_to_record(&value)
}

/// Decode a signed record from canonical bytes.
pub fn decode_signed(bytes: &[u8]) -> Result<SignedRecord> {
    let value = read_single_value(bytes)?;
    let map = expect_map(&value, signed_keys::COUNT, "signed record")?;

    check_version(map)?;

    let name = match get(map, signed_keys::NAME) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(malformed("missing name")),
    };

    let record = match get(map, signed_keys::RECORD) {
        Some(v) => value_to_record(v)?,
        None => return Err(malformed("missing record")),
    };

    let hash = match get(map, signed_keys::HASH) {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(malformed("missing hash")),
    };

    Ok(SignedRecord { name, record, hash })
}

fn write_record(buf: &mut Vec<u8>, record: &ContentRecord) {
    encode_uint(buf, 5, record_keys::COUNT as u64);

    encode_uint(buf, 0, record_keys::VERSION);
    encode_uint(buf, 0, FORMAT_VERSION);

    encode_uint(buf, 0, record_keys::TITLE);
    encode_text(buf, &record.title);

    encode_uint(buf, 0, record_keys::SECONDS);
    encode_int(buf, record.timestamp.timestamp());

    encode_uint(buf, 0, record_keys::NANOS);
    encode_uint(buf, 0, u64::from(record.timestamp.timestamp_subsec_nanos()));

    encode_uint(buf, 0, record_keys::BODY);
    encode_text(buf, &record.body);
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, !(n as u64));
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Parse exactly one CBOR item, rejecting trailing bytes.
fn read_single_value(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Err(CoreError::Decode("empty input".into()));
    }

    let mut cursor = Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(&mut cursor).map_err(|e| CoreError::Decode(e.to_string()))?;

    if cursor.position() != bytes.len() as u64 {
        return Err(CoreError::Decode("trailing bytes after record".into()));
    }
    Ok(value)
}

fn value_to_record(value: &Value) -> Result<ContentRecord> {
    let map = expect_map(value, record_keys::COUNT, "content record")?;

    check_version(map)?;

    let title = match get(map, record_keys::TITLE) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(malformed("missing title")),
    };

    let seconds = match get(map, record_keys::SECONDS) {
        Some(Value::Integer(i)) => {
            i64::try_from(i128::from(*i)).map_err(|_| malformed("seconds out of range"))?
        }
        _ => return Err(malformed("missing seconds")),
    };

    let nanos = match get(map, record_keys::NANOS) {
        Some(Value::Integer(i)) => {
            u32::try_from(i128::from(*i)).map_err(|_| malformed("nanos out of range"))?
        }
        _ => return Err(malformed("missing nanos")),
    };

    let timestamp: DateTime<Utc> =
        DateTime::from_timestamp(seconds, nanos).ok_or_else(|| malformed("invalid timestamp"))?;

    let body = match get(map, record_keys::BODY) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(malformed("missing body")),
    };

    Ok(ContentRecord {
        title,
        timestamp,
        body,
    })
}

fn expect_map<'a>(value: &'a Value, count: usize, what: &str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(m) if m.len() == count => Ok(m),
        Value::Map(m) => Err(CoreError::Decode(format!(
            "{what}: expected {count} entries, got {}",
            m.len()
        ))),
        _ => Err(CoreError::Decode(format!("{what}: expected map"))),
    }
}

fn check_version(map: &[(Value, Value)]) -> Result<()> {
    match get(map, 0) {
        Some(Value::Integer(i)) if i128::from(*i) == FORMAT_VERSION as i128 => Ok(()),
        Some(Value::Integer(i)) => Err(CoreError::Decode(format!(
            "unsupported format version: {}",
            i128::from(*i)
        ))),
        _ => Err(malformed("missing version")),
    }
}

/// Look up a value by integer key.
fn get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

fn malformed(msg: &str) -> CoreError {
    CoreError::Decode(msg.to_string())
}
