mod channel;
mod codec;
mod entry;
mod error;
mod event;
mod snapshot;

pub use channel::{ChannelId, SubmissionId, SubmissionReceipt};
pub use codec::{content_hash, decode, encode, Decoded, ENVELOPE_VERSION, MAX_PAYLOAD_BYTES};
pub use entry::{CorruptMarker, EntryBody, LogEntry};
pub use error::CodecError;
pub use event::{EventKind, ProductStatus, ProvenanceEvent};
pub use snapshot::StateSnapshot;
