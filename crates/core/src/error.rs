/// Local encoding failures. These are rejected before any network call and
/// are not retryable — the input itself is bad.
///
/// Decode failures are deliberately absent: malformed bytes read back from
/// the replica decode to a [`CorruptMarker`](crate::CorruptMarker), which is
/// data, never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Events must carry the external product id; it is never generated here.
    #[error("event has an empty product_id")]
    EmptyProductId,

    /// The encoded form exceeded the per-event payload cap.
    #[error("encoded payload is {size} bytes, exceeding the {limit}-byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The payload contained a value serde_json could not serialize.
    #[error("payload serialization failed: {0}")]
    Serialize(String),

    /// A snapshot-affecting event is missing a field the registry write needs.
    #[error("event payload missing required field '{field}' for kind '{kind}'")]
    MissingField { kind: String, field: String },

    /// A payload field is present but unusable (wrong type, unknown value).
    #[error("event payload field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}
