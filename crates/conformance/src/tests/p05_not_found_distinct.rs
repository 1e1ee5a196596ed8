//! P5: Snapshot not-found is distinct from call failure.
//!
//! A missing product id queries to `Ok(None)`; an unreachable registry
//! queries to `Err(RegistryError::ReadFailed)`. The two must be
//! distinguishable by type, not by message.

use provenant_client::RegistryError;

use crate::traits::TestableBackend;

pub async fn test_p05_not_found_distinct<B: TestableBackend>(backend: &B) -> Result<(), String> {
    let facade = backend.facade();

    match facade.get_snapshot("nonexistent-id").await {
        Ok(None) => {}
        Ok(Some(snapshot)) => {
            return Err(format!(
                "P5: nonexistent id returned a snapshot: {:?}",
                snapshot
            ))
        }
        Err(e) => {
            return Err(format!(
                "P5: nonexistent id should be Ok(None), got error: {}",
                e
            ))
        }
    }

    backend.set_registry_reachable(false).await;
    let result = facade.get_snapshot("nonexistent-id").await;
    backend.set_registry_reachable(true).await;

    match result {
        Err(RegistryError::ReadFailed { .. }) => Ok(()),
        Err(other) => Err(format!(
            "P5: unreachable registry should be ReadFailed, got: {}",
            other
        )),
        Ok(_) => Err("P5: unreachable registry should not return Ok".to_string()),
    }
}
