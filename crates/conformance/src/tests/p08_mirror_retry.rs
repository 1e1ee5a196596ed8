//! P8: Mirror retry.
//!
//! With the replica down for the first 2 fetches, a history read under a
//! 3-attempt retry policy succeeds on the third attempt and returns data
//! identical to a clean call.

use provenant_core::EventKind;

use crate::fixtures;
use crate::traits::TestableBackend;

pub async fn test_p08_mirror_retry<B: TestableBackend>(backend: &B) -> Result<(), String> {
    let facade = backend.facade();

    for i in 0..3 {
        facade
            .record_event(
                "P-1",
                EventKind::Updated,
                fixtures::note_payload(&format!("entry {}", i)),
            )
            .await
            .map_err(|e| format!("P8: record_event failed: {}", e))?;
    }
    backend.confirm_pending().await;

    backend.set_mirror_outages(2).await;
    let retried = facade
        .get_history("P-1", 0)
        .await
        .map_err(|e| format!("P8: history under outages failed: {}", e))?;

    let clean = facade
        .get_history("P-1", 0)
        .await
        .map_err(|e| format!("P8: clean history failed: {}", e))?;

    if retried != clean {
        return Err("P8: retried history differs from a clean call".to_string());
    }
    if retried.len() != 3 {
        return Err(format!("P8: expected 3 entries, got {}", retried.len()));
    }

    Ok(())
}
