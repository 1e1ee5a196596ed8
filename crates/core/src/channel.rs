use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the single append-only log channel used by a deployment.
///
/// At most one channel is created per deployment lifetime. Once created the
/// id is cached process-wide and reused; concurrent first-time creators must
/// converge on the first successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

/// Caller-side identifier of a submission: the sha-256 content address of the
/// canonical payload. Stable across retries of the same event, which is what
/// lets downstream consumers deduplicate if exactly-once delivery is needed.
pub type SubmissionId = String;

/// Receipt returned by the log service when a submission is accepted for
/// ordering. Acceptance is NOT finality — the entry becomes authoritative
/// only once the replica serves it with a sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub accepted: bool,
    pub submission_id: SubmissionId,
}
