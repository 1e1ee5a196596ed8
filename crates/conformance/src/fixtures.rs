//! Shared payload fixtures for the conformance suite.

use std::collections::BTreeMap;

use serde_json::json;

/// Payload for a `created` event: name plus description.
pub fn created_payload(name: &str) -> BTreeMap<String, serde_json::Value> {
    let mut payload = BTreeMap::new();
    payload.insert("name".to_string(), json!(name));
    payload.insert("description".to_string(), json!("conformance fixture"));
    payload
}

/// Payload for a `status_changed` event.
pub fn status_payload(status: &str) -> BTreeMap<String, serde_json::Value> {
    let mut payload = BTreeMap::new();
    payload.insert("status".to_string(), json!(status));
    payload
}

/// Payload for a log-only `updated` event (no snapshot fields).
pub fn note_payload(note: &str) -> BTreeMap<String, serde_json::Value> {
    let mut payload = BTreeMap::new();
    payload.insert("inspection_note".to_string(), json!(note));
    payload
}
