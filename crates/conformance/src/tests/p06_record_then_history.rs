//! P6: Record-then-history scenario.
//!
//! Submitting `{product_id: "P-1", kind: created, payload: {name: Widget}}`
//! and simulating confirmation yields exactly one history entry whose
//! decoded event matches what was submitted.

use provenant_core::EventKind;

use crate::fixtures;
use crate::traits::TestableBackend;

pub async fn test_p06_record_then_history<B: TestableBackend>(backend: &B) -> Result<(), String> {
    let facade = backend.facade();

    let outcome = facade
        .record_event("P-1", EventKind::Created, fixtures::created_payload("Widget"))
        .await
        .map_err(|e| format!("P6: record_event failed: {}", e))?;
    if !outcome.fully_recorded() {
        return Err(format!("P6: expected full record, got {:?}", outcome));
    }

    // Before confirmation the replica has nothing — submission is not
    // finality.
    let history = facade
        .get_history("P-1", 0)
        .await
        .map_err(|e| format!("P6: pre-confirmation get_history failed: {}", e))?;
    if !history.is_empty() {
        return Err(format!(
            "P6: history visible before confirmation: {} entries",
            history.len()
        ));
    }

    backend.confirm_pending().await;

    let history = facade
        .get_history("P-1", 0)
        .await
        .map_err(|e| format!("P6: get_history failed: {}", e))?;
    if history.len() != 1 {
        return Err(format!("P6: expected 1 entry, got {}", history.len()));
    }

    let event = history[0]
        .event()
        .ok_or_else(|| "P6: entry decoded as corrupt".to_string())?;
    if event.product_id != "P-1" {
        return Err(format!("P6: wrong product_id: {}", event.product_id));
    }
    if event.kind != EventKind::Created {
        return Err(format!("P6: wrong kind: {}", event.kind));
    }
    if event.payload.get("name") != Some(&serde_json::json!("Widget")) {
        return Err("P6: payload name did not round-trip".to_string());
    }

    Ok(())
}
