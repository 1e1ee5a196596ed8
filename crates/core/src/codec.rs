//! Canonical event codec.
//!
//! `encode` produces deterministic JSON: struct fields serialize in
//! declaration order and the payload map is a `BTreeMap`, so the same event
//! always yields the same bytes. `decode` is TOTAL — any byte sequence,
//! including empty, truncated, or random bytes, decodes to either an event
//! or a [`CorruptMarker`]; it never returns an error and never panics, so a
//! batch decode cannot be aborted by one bad entry.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::entry::CorruptMarker;
use crate::error::CodecError;
use crate::event::{EventKind, ProvenanceEvent};

/// Envelope schema version. Bumped only for incompatible layout changes;
/// unknown extra fields are tolerated without a bump.
pub const ENVELOPE_VERSION: u64 = 1;

/// Hard cap on the encoded size of a single event.
pub const MAX_PAYLOAD_BYTES: usize = 8 * 1024;

#[derive(Serialize)]
struct Envelope<'a> {
    v: u64,
    product_id: &'a str,
    kind: EventKind,
    payload: &'a BTreeMap<String, serde_json::Value>,
    submitted_at: &'a str,
}

/// Result of decoding bytes read back from the replica.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(ProvenanceEvent),
    Corrupt(CorruptMarker),
}

/// Serialize an event to its canonical byte payload.
pub fn encode(event: &ProvenanceEvent) -> Result<Vec<u8>, CodecError> {
    if event.product_id.is_empty() {
        return Err(CodecError::EmptyProductId);
    }

    let envelope = Envelope {
        v: ENVELOPE_VERSION,
        product_id: &event.product_id,
        kind: event.kind,
        payload: &event.payload,
        submitted_at: &event.submitted_at,
    };

    let bytes = serde_json::to_vec(&envelope).map_err(|e| CodecError::Serialize(e.to_string()))?;

    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(CodecError::PayloadTooLarge {
            size: bytes.len(),
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    Ok(bytes)
}

/// Decode a byte payload read back from the replica.
///
/// Never fails: parse errors, truncation, a wrong envelope version, and
/// missing required fields all yield [`Decoded::Corrupt`] carrying the raw
/// length and a diagnostic.
pub fn decode(bytes: &[u8]) -> Decoded {
    match decode_inner(bytes) {
        Ok(event) => Decoded::Event(event),
        Err(reason) => Decoded::Corrupt(CorruptMarker {
            raw_len: bytes.len(),
            reason,
        }),
    }
}

fn decode_inner(bytes: &[u8]) -> Result<ProvenanceEvent, String> {
    if bytes.is_empty() {
        return Err("empty payload".to_string());
    }

    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;

    let obj = value
        .as_object()
        .ok_or_else(|| "payload is not a JSON object".to_string())?;

    match obj.get("v").and_then(serde_json::Value::as_u64) {
        Some(ENVELOPE_VERSION) => {}
        Some(v) => return Err(format!("unsupported envelope version {}", v)),
        None => return Err("missing envelope version".to_string()),
    }

    let product_id = obj
        .get("product_id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| "missing product_id".to_string())?;
    if product_id.is_empty() {
        return Err("empty product_id".to_string());
    }

    let kind_str = obj
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| "missing kind".to_string())?;
    let kind =
        EventKind::parse(kind_str).ok_or_else(|| format!("unknown event kind '{}'", kind_str))?;

    // Schema drift tolerance: a missing payload map decodes as empty, and a
    // missing submitted_at decodes as the empty string. Both fields are
    // advisory; sequence and consensus timestamp come from the log itself.
    let payload = match obj.get("payload") {
        None | Some(serde_json::Value::Null) => BTreeMap::new(),
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
        Some(_) => return Err("payload is not an object".to_string()),
    };

    let submitted_at = obj
        .get("submitted_at")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("")
        .to_string();

    Ok(ProvenanceEvent {
        product_id: product_id.to_string(),
        kind,
        payload,
        submitted_at,
    })
}

/// sha-256 hex digest of an encoded payload — the content address used as a
/// submission idempotency key.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}
