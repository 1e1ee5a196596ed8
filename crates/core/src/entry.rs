use serde::{Deserialize, Serialize};

use crate::event::ProvenanceEvent;

/// A confirmed, ordered record read back from the replica.
///
/// `sequence_number` and `consensus_timestamp` are assigned by the log
/// service, never by this system. Entries whose payload could not be decoded
/// are preserved as [`EntryBody::Corrupt`] so gaps stay visible to auditors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Strictly increasing per channel.
    pub sequence_number: u64,
    /// Authoritative time, RFC 3339 string as reported by the replica.
    pub consensus_timestamp: String,
    pub body: EntryBody,
}

impl LogEntry {
    /// The decoded event, if this entry decoded cleanly.
    pub fn event(&self) -> Option<&ProvenanceEvent> {
        match &self.body {
            EntryBody::Event(event) => Some(event),
            EntryBody::Corrupt(_) => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self.body, EntryBody::Corrupt(_))
    }
}

/// The decoded form of a log entry's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryBody {
    Event(ProvenanceEvent),
    Corrupt(CorruptMarker),
}

/// Placeholder for an entry whose payload could not be decoded.
///
/// Malformed entries are never dropped from a batch; the marker carries the
/// raw payload's byte length and a diagnostic so an auditor can see exactly
/// what was unreadable and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptMarker {
    pub raw_len: usize,
    pub reason: String,
}
