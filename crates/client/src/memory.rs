//! In-memory transports for tests and local development.
//!
//! [`MemoryLog`] models the submission/finality gap that the real log
//! service has: a submitted payload is held as pending and only becomes
//! visible to the mirror — with a sequence number and consensus timestamp —
//! once `confirm_all` runs. [`MemoryRegistry`] models the contract's
//! receipt semantics, including create-once, update-requires-create, and
//! budget exhaustion, plus a reachability switch for failure testing.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use provenant_core::{ChannelId, SubmissionReceipt};

use crate::transport::{
    LogTransport, MirrorEntry, MirrorPage, MirrorTransport, ReceiptStatus, RegistryReceipt,
    RegistryTransport, ResourceBudget, SnapshotFields, TransportError,
};

/// Minimum budget a registry call consumes in the in-memory model.
const REGISTRY_CALL_COST: u64 = 100;

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

// ──────────────────────────────────────────────
// MemoryLog
// ──────────────────────────────────────────────

#[derive(Default)]
struct MemoryLogState {
    channels_created: u32,
    pending: Vec<Vec<u8>>,
    confirmed: Vec<MirrorEntry>,
    next_sequence: u64,
    mirror_outages: u32,
}

/// In-memory consensus log plus its own mirror view.
#[derive(Default)]
pub struct MemoryLog {
    state: Mutex<MemoryLogState>,
}

impl MemoryLog {
    pub fn new() -> Self {
        MemoryLog::default()
    }

    /// Assign sequence numbers and consensus timestamps to every pending
    /// submission, making them visible to the mirror (simulated finality).
    pub async fn confirm_all(&self) {
        let mut state = self.state.lock().await;
        let pending = std::mem::take(&mut state.pending);
        for payload in pending {
            state.next_sequence += 1;
            let entry = MirrorEntry {
                sequence_number: state.next_sequence,
                consensus_timestamp: now_rfc3339(),
                payload_b64: BASE64.encode(&payload),
            };
            state.confirmed.push(entry);
        }
    }

    /// Place raw bytes directly into the confirmed view, bypassing
    /// submission — how tests model a corrupt or foreign entry.
    pub async fn inject_raw_entry(&self, payload: &[u8]) {
        let mut state = self.state.lock().await;
        state.next_sequence += 1;
        let entry = MirrorEntry {
            sequence_number: state.next_sequence,
            consensus_timestamp: now_rfc3339(),
            payload_b64: BASE64.encode(payload),
        };
        state.confirmed.push(entry);
    }

    /// Fail the next `n` mirror fetches with a transport error.
    pub async fn set_mirror_outages(&self, n: u32) {
        self.state.lock().await.mirror_outages = n;
    }

    /// How many create-channel calls the service has observed.
    pub async fn channels_created(&self) -> u32 {
        self.state.lock().await.channels_created
    }

    /// Number of accepted-but-unconfirmed submissions.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

#[async_trait]
impl LogTransport for MemoryLog {
    async fn create_channel(&self) -> Result<ChannelId, TransportError> {
        let mut state = self.state.lock().await;
        state.channels_created += 1;
        // Every create yields a distinct id; a duplicate create is
        // visible to tests instead of silently converging.
        Ok(ChannelId(format!("channel-{}", state.channels_created)))
    }

    async fn submit(
        &self,
        _channel: &ChannelId,
        payload: &[u8],
        submission_id: &str,
    ) -> Result<SubmissionReceipt, TransportError> {
        let mut state = self.state.lock().await;
        state.pending.push(payload.to_vec());
        Ok(SubmissionReceipt {
            accepted: true,
            submission_id: submission_id.to_string(),
        })
    }
}

#[async_trait]
impl MirrorTransport for MemoryLog {
    async fn fetch_page(
        &self,
        _channel: &ChannelId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<MirrorPage, TransportError> {
        let mut state = self.state.lock().await;
        if state.mirror_outages > 0 {
            state.mirror_outages -= 1;
            return Err(TransportError::Connect("simulated outage".to_string()));
        }

        let start: usize = cursor
            .map(|c| c.parse())
            .transpose()
            .map_err(|_| TransportError::Body("bad cursor".to_string()))?
            .unwrap_or(0);
        let end = (start + page_size as usize).min(state.confirmed.len());
        let entries = state.confirmed[start.min(end)..end].to_vec();
        let next_cursor = if end < state.confirmed.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(MirrorPage {
            entries,
            next_cursor,
        })
    }
}

// ──────────────────────────────────────────────
// MemoryRegistry
// ──────────────────────────────────────────────

#[derive(Default)]
struct MemoryRegistryState {
    records: HashMap<String, SnapshotFields>,
    reachable: bool,
}

/// In-memory on-chain registry with contract-faithful receipts.
pub struct MemoryRegistry {
    state: Mutex<MemoryRegistryState>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        MemoryRegistry {
            state: Mutex::new(MemoryRegistryState {
                records: HashMap::new(),
                reachable: true,
            }),
        }
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        MemoryRegistry::default()
    }

    /// Toggle reachability: while unreachable every call fails at the
    /// transport level, the way a network partition would look.
    pub async fn set_reachable(&self, reachable: bool) {
        self.state.lock().await.reachable = reachable;
    }
}

#[async_trait]
impl RegistryTransport for MemoryRegistry {
    async fn create(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError> {
        let mut state = self.state.lock().await;
        if !state.reachable {
            return Err(TransportError::Connect("registry unreachable".to_string()));
        }
        if budget.limit < REGISTRY_CALL_COST {
            return Ok(receipt(ReceiptStatus::ResourceExhausted, ""));
        }
        if state.records.contains_key(product_id) {
            return Ok(receipt(ReceiptStatus::Reverted, ""));
        }
        let timestamp = now_rfc3339();
        state.records.insert(
            product_id.to_string(),
            SnapshotFields {
                name: name.to_string(),
                description: description.to_string(),
                status: status.to_string(),
                timestamp: timestamp.clone(),
            },
        );
        Ok(receipt(ReceiptStatus::Success, &timestamp))
    }

    async fn update(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError> {
        let mut state = self.state.lock().await;
        if !state.reachable {
            return Err(TransportError::Connect("registry unreachable".to_string()));
        }
        if budget.limit < REGISTRY_CALL_COST {
            return Ok(receipt(ReceiptStatus::ResourceExhausted, ""));
        }
        if !state.records.contains_key(product_id) {
            return Ok(receipt(ReceiptStatus::NotFound, ""));
        }
        let timestamp = now_rfc3339();
        state.records.insert(
            product_id.to_string(),
            SnapshotFields {
                name: name.to_string(),
                description: description.to_string(),
                status: status.to_string(),
                timestamp: timestamp.clone(),
            },
        );
        Ok(receipt(ReceiptStatus::Success, &timestamp))
    }

    async fn query(
        &self,
        product_id: &str,
        _budget: ResourceBudget,
    ) -> Result<Option<SnapshotFields>, TransportError> {
        let state = self.state.lock().await;
        if !state.reachable {
            return Err(TransportError::Connect("registry unreachable".to_string()));
        }
        Ok(state.records.get(product_id).cloned())
    }
}

fn receipt(status: ReceiptStatus, timestamp: &str) -> RegistryReceipt {
    RegistryReceipt {
        status,
        consensus_timestamp: timestamp.to_string(),
    }
}
