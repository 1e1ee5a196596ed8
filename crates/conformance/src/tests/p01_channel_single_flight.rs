//! P1: Idempotent channel creation.
//!
//! N concurrent callers over the same facade must converge on exactly one
//! created channel; the log service observes exactly one create call.

use std::sync::Arc;

use provenant_core::EventKind;

use crate::fixtures;
use crate::traits::TestableBackend;

pub async fn test_p01_channel_single_flight<B: TestableBackend>(
    backend: &B,
) -> Result<(), String> {
    let facade = Arc::new(backend.facade());

    let mut handles = Vec::new();
    for i in 0..8 {
        let facade = facade.clone();
        handles.push(tokio::spawn(async move {
            facade
                .record_event(
                    "P-1",
                    EventKind::Updated,
                    fixtures::note_payload(&format!("concurrent writer {}", i)),
                )
                .await
        }));
    }

    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| format!("P1: task panicked: {}", e))?
            .map_err(|e| format!("P1: record_event failed: {}", e))?;
        if outcome.submission.is_err() {
            return Err(format!(
                "P1: submission failed: {:?}",
                outcome.submission
            ));
        }
    }

    let created = backend.channels_created().await;
    if created != 1 {
        return Err(format!(
            "P1: expected exactly one channel creation, observed {}",
            created
        ));
    }

    Ok(())
}
