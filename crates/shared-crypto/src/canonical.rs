//! # Canonical JSON
//!
//! Re-encodes a JSON value so that object keys appear in byte-wise sorted
//! order at every depth. Array order is preserved, no whitespace is emitted.
//!
//! Keys are sorted explicitly instead of relying on `serde_json::Map`
//! ordering, which changes when `preserve_order` is enabled anywhere in the
//! dependency graph.

use serde::Serialize;
use serde_json::Value;

use crate::errors::CryptoError;

/// Canonical encoding of a JSON value.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::with_capacity(128);
    write_value(value, &mut out)?;
    Ok(out)
}

/// Serialize `value` to JSON, then encode it canonically.
pub fn canonical_json_of<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    canonical_json(&serde_json::to_value(value)?)
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CryptoError> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out)?;
                out.push(b':');
                if let Some(child) = map.get(key) {
                    write_value(child, out)?;
                }
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::String(s) => write_string(s, out)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            serde_json::to_writer(&mut *out, value)?;
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> Result<(), CryptoError> {
    let encoded = serde_json::to_string(s)?;
    for ch in encoded.chars() {
        match ch {
            '<' => out.extend_from_slice(b"\\u003c"),
            '>' => out.extend_from_slice(b"\\u003e"),
            '&' => out.extend_from_slice(b"\\u0026"),
            '\u{2028}' => out.extend_from_slice(b"\\u2028"),
            '\u{2029}' => out.extend_from_slice(b"\\u2029"),
            other => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    Ok(())
}
