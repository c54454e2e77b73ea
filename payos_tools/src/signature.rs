//! Payload signing for PayOS requests and webhooks.
//!
//! The gateway signs and verifies JSON payloads as follows:
//! 1. Object keys are sorted lexicographically (at every nesting level).
//! 2. The payload is serialised compactly, without any insignificant whitespace.
//! 3. HMAC-SHA256 is computed over the UTF-8 bytes using the merchant's checksum key.
//! 4. The MAC is encoded as lowercase hex.
//!
//! The same routine is used for outbound `x-checksum` headers and inbound `x-signature` webhook headers.
use hmac::{Hmac, Mac};
use log::*;
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::PayosApiError;

type HmacSha256 = Hmac<Sha256>;

/// Produces the canonical string form of a JSON value.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<&String>>();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serialising a string into JSON cannot fail
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn mac_over(payload: &Value, key: &str) -> Result<HmacSha256, PayosApiError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| PayosApiError::Signing(e.to_string()))?;
    mac.update(canonicalize(payload).as_bytes());
    Ok(mac)
}

/// Signs a JSON payload with the checksum key and returns the lowercase hex digest.
pub fn sign(payload: &Value, key: &str) -> Result<String, PayosApiError> {
    let mac = mac_over(payload, key)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Convenience wrapper around [`sign`] for any serialisable payload.
pub fn sign_serializable<T: Serialize>(payload: &T, key: &str) -> Result<String, PayosApiError> {
    let value = serde_json::to_value(payload).map_err(|e| PayosApiError::JsonError(e.to_string()))?;
    sign(&value, key)
}

/// Recomputes the signature over `payload` and compares it to `signature` in constant time.
pub fn verify(payload: &Value, signature: &str, key: &str) -> bool {
    let expected = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("🔐️ Signature is not valid hex. {e}");
            return false;
        },
    };
    match mac_over(payload, key) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(e) => {
            warn!("🔐️ Could not compute signature. {e}");
            false
        },
    }
}
