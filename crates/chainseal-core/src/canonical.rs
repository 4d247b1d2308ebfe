//! Canonical CBOR encoding for chunk payloads.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats in the shortest of half, single or double precision that
//!   keeps the value exactly; every NaN becomes `0xf97e00`
//!
//! The same bytes are hashed at finalize time and re-derived by the
//! verifier after decryption, so any nondeterminism here would flag
//! untampered documents as compromised.
//!
//! Payload layout: `{ "index": uint, "items": [item...], "prevHash": text }`

use ciborium::value::{Integer, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::chunk::PrevHash;
use crate::error::CoreError;

/// Payload map keys.
mod keys {
    pub const INDEX: &str = "index";
    pub const ITEMS: &str = "items";
    pub const PREV_HASH: &str = "prevHash";
}

/// A decoded chunk payload.
///
/// Items stay as CBOR values so the verifier can re-encode them without
/// knowing the caller's item type.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub items: Vec<Value>,
    pub prev_hash: String,
    pub index: u64,
}

/// Convert an item into a CBOR value.
pub fn item_to_value<T: Serialize>(item: &T) -> Result<Value, CoreError> {
    Value::serialized(item).map_err(|e| CoreError::EncodingError(e.to_string()))
}

/// Convert a CBOR value back into a typed item.
pub fn item_from_value<T: DeserializeOwned>(value: &Value) -> Result<T, CoreError> {
    value
        .deserialized()
        .map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Encode a segment payload to canonical bytes.
pub fn canonical_payload(
    items: &[Value],
    prev_hash: &PrevHash,
    index: u32,
) -> Result<Vec<u8>, CoreError> {
    canonical_payload_raw(items, &prev_hash.to_text(), index)
}

/// [`canonical_payload`] with the back-link given as stored text.
///
/// The verifier re-derives payloads from whatever `prevHash` text was
/// stored, parseable or not.
pub fn canonical_payload_raw(
    items: &[Value],
    prev_hash: &str,
    index: u32,
) -> Result<Vec<u8>, CoreError> {
    let entries = vec![
        (
            Value::Text(keys::ITEMS.to_string()),
            Value::Array(items.to_vec()),
        ),
        (
            Value::Text(keys::PREV_HASH.to_string()),
            Value::Text(prev_hash.to_string()),
        ),
        (
            Value::Text(keys::INDEX.to_string()),
            Value::Integer(index.into()),
        ),
    ];

    encode_cbor_canonical(&Value::Map(entries))
}

/// Encode a CBOR value to canonical bytes.
pub fn encode_cbor_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner)?;
        }
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => encode_float(buf, *f),
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
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
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a float in its shortest exact form (major type 7).
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    if f.is_nan() {
        buf.extend_from_slice(&[0xf9, 0x7e, 0x00]);
    } else if let Some(half) = to_f16_bits(f) {
        buf.push(0xf9);
        buf.extend_from_slice(&half.to_be_bytes());
    } else if f64::from(f as f32) == f {
        buf.push(0xfa);
        buf.extend_from_slice(&(f as f32).to_bits().to_be_bytes());
    } else {
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_bits().to_be_bytes());
    }
}

/// IEEE 754 half-precision bits for `f`, if the conversion is exact.
///
/// `f` must not be NaN.
fn to_f16_bits(f: f64) -> Option<u16> {
    let single = f as f32;
    if f64::from(single) != f {
        return None;
    }

    let bits = single.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    match exponent {
        // Infinity; NaN is handled by the caller.
        0xff => Some(sign | 0x7c00),
        // Zero. Single-precision subnormals are far below half range.
        0 => (mantissa == 0).then_some(sign),
        _ => {
            let unbiased = exponent - 127;
            if unbiased > 15 {
                None
            } else if unbiased >= -14 {
                // Normal half: the low 13 mantissa bits must be zero.
                (mantissa & 0x1fff == 0)
                    .then(|| sign | (((unbiased + 15) as u16) << 10) | (mantissa >> 13) as u16)
            } else if unbiased >= -24 {
                // Subnormal half: value = m * 2^-24.
                let significand = mantissa | 0x0080_0000;
                let shift = (-(unbiased + 1)) as u32;
                (significand & ((1 << shift) - 1) == 0)
                    .then(|| sign | (significand >> shift) as u16)
            } else {
                None
            }
        }
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut key_value_pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        key_value_pairs.push((key_buf, v));
    }

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Decode a payload from (decrypted) bytes.
pub fn decode_payload(bytes: &[u8]) -> Result<Payload, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedPayload("expected map".into())),
    };

    let get = |key: &str| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
            .map(|(_, v)| v)
    };

    let items = match get(keys::ITEMS) {
        Some(Value::Array(arr)) => arr.clone(),
        _ => return Err(CoreError::MalformedPayload("missing items".into())),
    };

    let prev_hash = match get(keys::PREV_HASH) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::MalformedPayload("missing prevHash".into())),
    };

    let index = match get(keys::INDEX) {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            u64::try_from(n)
                .map_err(|_| CoreError::MalformedPayload(format!("invalid index: {}", n)))?
        }
        _ => return Err(CoreError::MalformedPayload("missing index".into())),
    };

    Ok(Payload {
        items,
        prev_hash,
        index,
    })
}
