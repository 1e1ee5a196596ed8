use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of domain fact a [`ProvenanceEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The product was registered for the first time.
    Created,
    /// One or more product fields changed.
    Updated,
    /// The product's certification status changed.
    StatusChanged,
}

impl EventKind {
    /// The wire name of this kind (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::StatusChanged => "status_changed",
        }
    }

    /// Parse a wire name back into a kind. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(EventKind::Created),
            "updated" => Some(EventKind::Updated),
            "status_changed" => Some(EventKind::StatusChanged),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certification status of a product — the same domain enum the relational
/// store uses, so snapshots and store rows compare directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Suspended,
    Recalled,
    Expired,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Suspended => "suspended",
            ProductStatus::Recalled => "recalled",
            ProductStatus::Expired => "expired",
        }
    }

    /// Parse a wire name. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProductStatus::Active),
            "suspended" => Some(ProductStatus::Suspended),
            "recalled" => Some(ProductStatus::Recalled),
            "expired" => Some(ProductStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable domain fact about a product, owned by the caller until it is
/// submitted to the consensus log.
///
/// The payload is a `BTreeMap` so the canonical encoding is deterministic:
/// the same event always serializes to the same bytes, which is what makes
/// content-addressed submission ids stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEvent {
    /// External product id. Never generated by this system.
    pub product_id: String,
    pub kind: EventKind,
    /// Opaque key/value payload. Encoded size is capped by
    /// [`MAX_PAYLOAD_BYTES`](crate::MAX_PAYLOAD_BYTES).
    pub payload: BTreeMap<String, serde_json::Value>,
    /// Client-observed wall time (RFC 3339). Advisory only — the consensus
    /// timestamp assigned by the log is the authoritative time.
    pub submitted_at: String,
}

impl ProvenanceEvent {
    pub fn new(
        product_id: impl Into<String>,
        kind: EventKind,
        payload: BTreeMap<String, serde_json::Value>,
        submitted_at: impl Into<String>,
    ) -> Self {
        ProvenanceEvent {
            product_id: product_id.into(),
            kind,
            payload,
            submitted_at: submitted_at.into(),
        }
    }
}
