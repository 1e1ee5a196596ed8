//! Clients for the three external planes of the provenance core and the
//! facade that coordinates them.
//!
//! Three levels of abstraction:
//! - [`transport`] — `#[async_trait]` seams over the raw network services
//!   (consensus log, mirror replica, on-chain registry), so tests inject
//!   fakes and the HTTP implementations stay swappable
//! - [`log`], [`registry`], [`mirror`] — one client per plane, owning the
//!   plane-specific semantics (channel lifecycle, receipt authority,
//!   defensive page decoding)
//! - [`facade`] — the single entry point the embedding application calls
//!
//! Nothing here retries a write on its own: retry policy belongs to the
//! caller, because only the caller knows whether retrying is safe.

pub mod config;
pub mod directory;
pub mod facade;
pub mod http;
pub mod log;
pub mod memory;
pub mod mirror;
pub mod registry;
pub mod retry;
pub mod transport;

pub use config::ConnectionConfig;
pub use directory::{DirectoryError, ProductDirectory, ProductRecord, StaticDirectory};
pub use facade::{Provenance, RecordError, RecordOutcome};
pub use http::HttpConnection;
pub use log::{ConsensusLogClient, LogError};
pub use memory::{MemoryLog, MemoryRegistry};
pub use mirror::{HistoryPage, MirrorError, MirrorReader};
pub use registry::{RegistryError, StateRegistryClient};
pub use retry::RetryPolicy;
pub use transport::{
    LogTransport, MirrorEntry, MirrorPage, MirrorTransport, ReceiptStatus, RegistryReceipt,
    RegistryTransport, ResourceBudget, SnapshotFields, TransportError,
};
