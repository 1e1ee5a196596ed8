//! Transport seams over the three external services.
//!
//! One trait per plane. Implementations handle protocol-specific details
//! (HTTP requests, in-memory fakes); the clients in [`log`](crate::log),
//! [`registry`](crate::registry), and [`mirror`](crate::mirror) own the
//! semantics on top. Receipts and pages here are wire-level: the registry
//! receipt status is authoritative even when the transport call itself
//! succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use provenant_core::{ChannelId, SubmissionReceipt};

/// Low-level transport failure. Clients map these into the public error
/// taxonomy; callers never see this type through the facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection-level failure (DNS, refused, TLS, protocol).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The caller-supplied timeout elapsed before the call completed.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The service answered with an unexpected HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    /// The response body could not be parsed.
    #[error("malformed response body: {0}")]
    Body(String),
}

// ──────────────────────────────────────────────
// Consensus log
// ──────────────────────────────────────────────

/// Transport for the append-only consensus log service.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Create a new log channel and return its identifier.
    async fn create_channel(&self) -> Result<ChannelId, TransportError>;

    /// Submit an opaque payload for ordering on a channel.
    ///
    /// Returns once the log has ACCEPTED the submission — not once it is
    /// finalized. `submission_id` is the caller's content address for the
    /// payload and travels with it so downstream consumers can deduplicate.
    async fn submit(
        &self,
        channel: &ChannelId,
        payload: &[u8],
        submission_id: &str,
    ) -> Result<SubmissionReceipt, TransportError>;
}

// ──────────────────────────────────────────────
// Mirror replica
// ──────────────────────────────────────────────

/// One wire-level entry from the replica's message page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorEntry {
    pub sequence_number: u64,
    pub consensus_timestamp: String,
    /// Base64-encoded payload, exactly as the replica serves it.
    #[serde(rename = "payload")]
    pub payload_b64: String,
}

/// One bounded page of replica entries plus the cursor to the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPage {
    pub entries: Vec<MirrorEntry>,
    /// Opaque continuation cursor. `None` when the page is the last one.
    #[serde(rename = "next")]
    pub next_cursor: Option<String>,
}

/// Transport for the read-only mirror/replica query service.
///
/// The replica lags the log by an unspecified, variable delay; an empty page
/// means "no confirmed messages yet", not an error.
#[async_trait]
pub trait MirrorTransport: Send + Sync {
    /// Fetch one page of a channel's confirmed messages.
    async fn fetch_page(
        &self,
        channel: &ChannelId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<MirrorPage, TransportError>;
}

// ──────────────────────────────────────────────
// On-chain registry
// ──────────────────────────────────────────────

/// Gas/resource budget for a registry call. Every call is bounded; exceeding
/// the budget is reported distinctly from a logical revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub limit: u64,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        ResourceBudget { limit: 100_000 }
    }
}

/// Status reported by a registry write receipt. The receipt is the
/// authority on whether the write happened — a transport-level success with
/// a `Reverted` receipt is still a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted,
    /// The target product id has no registry record (update of a
    /// never-created id).
    NotFound,
    /// The call ran out of its resource budget.
    ResourceExhausted,
}

/// Confirmation receipt for a registry write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryReceipt {
    pub status: ReceiptStatus,
    /// Log-assigned time of the write, RFC 3339. Empty on non-success.
    pub consensus_timestamp: String,
}

/// Decoded string fields returned by the registry's query function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFields {
    pub name: String,
    pub description: String,
    pub status: String,
    pub timestamp: String,
}

/// Transport for the on-chain key/value contract registry: three named
/// remote calls keyed by product id.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn create(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError>;

    async fn update(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError>;

    /// Read-only query. `Ok(None)` means the registry has no record for the
    /// product — distinct from a failed call.
    async fn query(
        &self,
        product_id: &str,
        budget: ResourceBudget,
    ) -> Result<Option<SnapshotFields>, TransportError>;
}
