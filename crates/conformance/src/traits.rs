use async_trait::async_trait;

use provenant_client::Provenance;

/// Trait that any backend implementation must implement to run the
/// conformance suite. A "backend" is the trio of services behind the
/// facade — consensus log, mirror replica, and on-chain registry — plus
/// the control hooks the properties need to simulate finality and faults.
#[async_trait]
pub trait TestableBackend: Send + Sync {
    /// Build a facade over this backend's services.
    ///
    /// Every call returns a fresh facade (fresh channel cache), all
    /// sharing the same underlying services. The facade's mirror reader
    /// must carry a retry policy of exactly 3 attempts with test-scale
    /// delays, so the retry properties terminate quickly.
    fn facade(&self) -> Provenance;

    /// Drive all accepted submissions to mirror visibility, assigning
    /// sequence numbers and consensus timestamps (simulated finality).
    async fn confirm_pending(&self);

    /// Make raw bytes visible in the mirror as a confirmed entry,
    /// bypassing submission — models a corrupt or foreign entry.
    async fn inject_raw_entry(&self, payload: &[u8]);

    /// Fail the next `outages` replica page fetches at the transport level.
    async fn set_mirror_outages(&self, outages: u32);

    /// Toggle registry reachability. While unreachable, every registry
    /// call must fail at the transport level.
    async fn set_registry_reachable(&self, reachable: bool);

    /// Number of create-channel calls the log service has observed.
    async fn channels_created(&self) -> u32;
}
