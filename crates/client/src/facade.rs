//! Provenance facade — the single entry point the embedding application
//! calls.
//!
//! Coordinates the consensus log client, the state registry client, and the
//! mirror reader, hiding channel-lifecycle bootstrapping. The log half and
//! the registry half of a recorded event are NOT transactional across the
//! two backends: a crash between them leaves each backend individually
//! consistent and mutually out of sync until the next reconciliation read,
//! which is the expected steady state. The facade therefore reports the two
//! halves independently and never retries either on its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};

use provenant_core::{
    encode, CodecError, EventKind, LogEntry, ProductStatus, ProvenanceEvent, StateSnapshot,
    SubmissionId,
};

use crate::config::ConnectionConfig;
use crate::directory::{DirectoryError, ProductDirectory};
use crate::http::HttpConnection;
use crate::log::{ConsensusLogClient, LogError};
use crate::mirror::{MirrorError, MirrorReader};
use crate::registry::{RegistryError, StateRegistryClient};

/// Failures that reject a `record_event` call before any network write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The event itself is invalid (encoding, missing snapshot fields).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The relational store has no such product.
    #[error("product '{product_id}' not found in directory")]
    UnknownProduct { product_id: String },

    /// The directory lookup itself failed.
    #[error("directory lookup failed: {0}")]
    Directory(String),
}

/// The two independent halves of a recorded event.
///
/// `submission` is the log half; `registry` is the snapshot half, `None`
/// when the event kind did not call for a registry write. An embedding
/// application should show "recorded" only when [`fully_recorded`] holds,
/// and "partially recorded, will reconcile" when [`partially_recorded`]
/// does — the replica eventually reflects the log half regardless of
/// registry state.
///
/// [`fully_recorded`]: RecordOutcome::fully_recorded
/// [`partially_recorded`]: RecordOutcome::partially_recorded
#[derive(Debug)]
pub struct RecordOutcome {
    pub submission: Result<SubmissionId, LogError>,
    pub registry: Option<Result<(), RegistryError>>,
}

impl RecordOutcome {
    pub fn fully_recorded(&self) -> bool {
        self.submission.is_ok() && self.registry.as_ref().map_or(true, |r| r.is_ok())
    }

    pub fn partially_recorded(&self) -> bool {
        let registry_ok = self.registry.as_ref().is_some_and(|r| r.is_ok());
        !self.fully_recorded() && (self.submission.is_ok() || registry_ok)
    }
}

/// What the registry half of a `record_event` call will do.
enum RegistryWrite {
    Create {
        name: String,
        description: String,
        status: ProductStatus,
    },
    Update {
        name: Option<String>,
        description: Option<String>,
        status: Option<ProductStatus>,
    },
}

/// The provenance core's public surface.
pub struct Provenance {
    log: ConsensusLogClient,
    registry: StateRegistryClient,
    mirror: MirrorReader,
    directory: Option<Arc<dyn ProductDirectory>>,
}

impl Provenance {
    pub fn new(
        log: ConsensusLogClient,
        registry: StateRegistryClient,
        mirror: MirrorReader,
    ) -> Self {
        Provenance {
            log,
            registry,
            mirror,
            directory: None,
        }
    }

    /// Attach the relational-store collaborator. With a directory set,
    /// `record_event` verifies the product exists before writing anywhere,
    /// and `sync_log_pointer` persists pointers through it.
    pub fn with_directory(mut self, directory: Arc<dyn ProductDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Wire all three clients over HTTP from one connection config.
    pub fn over_http(config: ConnectionConfig) -> Self {
        let connection = Arc::new(HttpConnection::new(config.clone()));
        let log = match config.channel_override {
            Some(channel) => ConsensusLogClient::with_channel(connection.clone(), channel),
            None => ConsensusLogClient::new(connection.clone()),
        };
        let registry = StateRegistryClient::new(connection.clone());
        let mirror = MirrorReader::new(connection);
        Provenance::new(log, registry, mirror)
    }

    /// Record a domain event: encode, ensure the channel, submit to the
    /// log, and — when the kind affects the snapshot — write the registry.
    ///
    /// Local validation happens before any network call. The log half and
    /// registry half then run independently; one failing never rolls back
    /// the other. See [`RecordOutcome`].
    pub async fn record_event(
        &self,
        product_id: &str,
        kind: EventKind,
        payload: BTreeMap<String, serde_json::Value>,
    ) -> Result<RecordOutcome, RecordError> {
        let event = ProvenanceEvent::new(product_id, kind, payload, now_rfc3339());
        let plan = plan_registry_write(&event)?;
        let bytes = encode(&event)?;

        if let Some(directory) = &self.directory {
            directory
                .get_product(product_id)
                .await
                .map_err(|e| match e {
                    DirectoryError::ProductNotFound { product_id } => {
                        RecordError::UnknownProduct { product_id }
                    }
                    DirectoryError::Backend(msg) => RecordError::Directory(msg),
                })?;
        }

        let submission = match self.log.ensure_channel().await {
            Ok(channel) => self.log.submit(&channel, &bytes).await,
            Err(err) => Err(err),
        };

        let registry = match plan {
            None => None,
            Some(write) => Some(self.apply_registry_write(product_id, write).await),
        };

        let outcome = RecordOutcome {
            submission,
            registry,
        };
        if outcome.fully_recorded() {
            debug!(product_id, kind = %kind, "event recorded on both planes");
        } else if outcome.partially_recorded() {
            warn!(
                product_id,
                kind = %kind,
                log_ok = outcome.submission.is_ok(),
                "event partially recorded; planes reconcile via the replica"
            );
        }
        Ok(outcome)
    }

    /// Current on-chain snapshot for a product. `Ok(None)` when the
    /// registry has no record.
    pub async fn get_snapshot(
        &self,
        product_id: &str,
    ) -> Result<Option<StateSnapshot>, RegistryError> {
        self.registry.query(product_id).await
    }

    /// Full ordered history for a product.
    ///
    /// Fetches the channel history (scanning at most `limit` entries,
    /// 0 = all) and filters client-side by the decoded event's product id.
    /// Entries whose decode failed are RETAINED as corrupt markers — the
    /// product they belonged to is unknown, and discarding them would hide
    /// audit gaps.
    pub async fn get_history(
        &self,
        product_id: &str,
        limit: usize,
    ) -> Result<Vec<LogEntry>, MirrorError> {
        let channel = self
            .log
            .ensure_channel()
            .await
            .map_err(|e| MirrorError::Unavailable {
                reason: format!("channel unavailable: {}", e),
            })?;

        let mut entries = self.mirror.fetch_history(&channel, limit).await?;
        entries.retain(|entry| match entry.event() {
            Some(event) => event.product_id == product_id,
            None => true,
        });
        Ok(entries)
    }

    /// Reconcile the relational store's audit pointer: find the highest
    /// confirmed sequence number for the product and persist it through the
    /// directory, if one is attached. Returns that sequence number.
    pub async fn sync_log_pointer(&self, product_id: &str) -> Result<Option<u64>, MirrorError> {
        let history = self.get_history(product_id, 0).await?;
        let latest = history
            .iter()
            .filter(|entry| !entry.is_corrupt())
            .map(|entry| entry.sequence_number)
            .max();

        if let (Some(sequence), Some(directory)) = (latest, &self.directory) {
            if let Err(err) = directory.persist_log_pointer(product_id, sequence).await {
                warn!(product_id, sequence, error = %err, "log pointer persist failed");
            }
        }
        Ok(latest)
    }

    async fn apply_registry_write(
        &self,
        product_id: &str,
        write: RegistryWrite,
    ) -> Result<(), RegistryError> {
        match write {
            RegistryWrite::Create {
                name,
                description,
                status,
            } => {
                self.registry
                    .create(product_id, &name, &description, status)
                    .await
            }
            RegistryWrite::Update {
                name,
                description,
                status,
            } => {
                // Read-merge-write: unchanged fields survive from the
                // current snapshot. An update of a never-created product
                // surfaces as NotFound here, before the write is attempted.
                let current = match self.registry.query(product_id).await? {
                    Some(snapshot) => snapshot,
                    None => {
                        return Err(RegistryError::NotFound {
                            product_id: product_id.to_string(),
                        })
                    }
                };
                self.registry
                    .update(
                        product_id,
                        name.as_deref().unwrap_or(&current.name),
                        description.as_deref().unwrap_or(&current.description),
                        status.unwrap_or(current.status),
                    )
                    .await
            }
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Decide the registry half for an event, validating the payload fields it
/// needs. Runs before any network call so bad input never reaches a wire.
fn plan_registry_write(event: &ProvenanceEvent) -> Result<Option<RegistryWrite>, CodecError> {
    let name = payload_str(event, "name");
    let description = payload_str(event, "description");
    let status = payload_status(event)?;

    match event.kind {
        EventKind::Created => {
            let name = name.ok_or_else(|| CodecError::MissingField {
                kind: event.kind.as_str().to_string(),
                field: "name".to_string(),
            })?;
            Ok(Some(RegistryWrite::Create {
                name,
                description: description.unwrap_or_default(),
                // A freshly certified product starts active unless the
                // payload says otherwise.
                status: status.unwrap_or(ProductStatus::Active),
            }))
        }
        EventKind::StatusChanged => {
            if status.is_none() {
                return Err(CodecError::MissingField {
                    kind: event.kind.as_str().to_string(),
                    field: "status".to_string(),
                });
            }
            Ok(Some(RegistryWrite::Update {
                name,
                description,
                status,
            }))
        }
        EventKind::Updated => {
            if name.is_none() && description.is_none() && status.is_none() {
                // Nothing snapshot-affecting in the payload: log-only event.
                return Ok(None);
            }
            Ok(Some(RegistryWrite::Update {
                name,
                description,
                status,
            }))
        }
    }
}

fn payload_str(event: &ProvenanceEvent, key: &str) -> Option<String> {
    event
        .payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(|s| s.to_string())
}

fn payload_status(event: &ProvenanceEvent) -> Result<Option<ProductStatus>, CodecError> {
    match event.payload.get("status") {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_str().ok_or_else(|| CodecError::InvalidField {
                field: "status".to_string(),
                reason: "not a string".to_string(),
            })?;
            ProductStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| CodecError::InvalidField {
                    field: "status".to_string(),
                    reason: format!("unknown status '{}'", raw),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{ProductRecord, StaticDirectory};
    use crate::memory::{MemoryLog, MemoryRegistry};

    fn facade(log: Arc<MemoryLog>, registry: Arc<MemoryRegistry>) -> Provenance {
        Provenance::new(
            ConsensusLogClient::new(log.clone()),
            StateRegistryClient::new(registry),
            MirrorReader::new(log),
        )
    }

    fn created_payload(name: &str) -> BTreeMap<String, serde_json::Value> {
        let mut payload = BTreeMap::new();
        payload.insert("name".to_string(), serde_json::json!(name));
        payload
    }

    fn status_payload(status: &str) -> BTreeMap<String, serde_json::Value> {
        let mut payload = BTreeMap::new();
        payload.insert("status".to_string(), serde_json::json!(status));
        payload
    }

    #[tokio::test]
    async fn record_created_writes_both_planes() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry.clone());

        let outcome = provenance
            .record_event("P-1", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();

        assert!(outcome.fully_recorded());
        assert_eq!(log.pending_count().await, 1);

        let snapshot = provenance.get_snapshot("P-1").await.unwrap().unwrap();
        assert_eq!(snapshot.name, "Widget");
        assert_eq!(snapshot.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn record_created_without_name_is_rejected_locally() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry);

        let err = provenance
            .record_event("P-1", EventKind::Created, BTreeMap::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RecordError::Codec(CodecError::MissingField { .. })
        ));
        // Rejected before any network call: nothing was submitted.
        assert_eq!(log.pending_count().await, 0);
        assert_eq!(log.channels_created().await, 0);
    }

    #[tokio::test]
    async fn record_updated_without_snapshot_fields_is_log_only() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry);

        let mut payload = BTreeMap::new();
        payload.insert("inspection_note".to_string(), serde_json::json!("passed"));
        let outcome = provenance
            .record_event("P-1", EventKind::Updated, payload)
            .await
            .unwrap();

        assert!(outcome.submission.is_ok());
        assert!(outcome.registry.is_none());
        assert!(outcome.fully_recorded());
    }

    #[tokio::test]
    async fn status_change_updates_registry_with_overlay() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry);

        provenance
            .record_event("P-2", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();
        let outcome = provenance
            .record_event("P-2", EventKind::StatusChanged, status_payload("recalled"))
            .await
            .unwrap();
        assert!(outcome.fully_recorded());

        let snapshot = provenance.get_snapshot("P-2").await.unwrap().unwrap();
        assert_eq!(snapshot.status, ProductStatus::Recalled);
        // Name survived the overlay even though the payload omitted it.
        assert_eq!(snapshot.name, "Widget");
    }

    #[tokio::test]
    async fn status_change_with_unknown_status_is_invalid_field() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log, registry);

        let err = provenance
            .record_event("P-2", EventKind::StatusChanged, status_payload("vaporized"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Codec(CodecError::InvalidField { .. })
        ));
    }

    #[tokio::test]
    async fn status_change_before_create_reports_not_found_half() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log, registry);

        let outcome = provenance
            .record_event("P-9", EventKind::StatusChanged, status_payload("recalled"))
            .await
            .unwrap();

        assert!(outcome.submission.is_ok());
        assert_eq!(
            outcome.registry,
            Some(Err(RegistryError::NotFound {
                product_id: "P-9".to_string()
            }))
        );
        assert!(outcome.partially_recorded());
    }

    #[tokio::test]
    async fn unreachable_registry_leaves_log_half_intact() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        registry.set_reachable(false).await;
        let provenance = facade(log.clone(), registry);

        let outcome = provenance
            .record_event("P-1", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();

        assert!(outcome.submission.is_ok());
        assert!(matches!(
            outcome.registry,
            Some(Err(RegistryError::WriteFailed { .. }))
        ));
        assert!(outcome.partially_recorded());
        assert_eq!(log.pending_count().await, 1);
    }

    #[tokio::test]
    async fn history_roundtrip_after_confirmation() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry);

        provenance
            .record_event("P-1", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();
        provenance
            .record_event("P-other", EventKind::Created, created_payload("Gadget"))
            .await
            .unwrap();
        log.confirm_all().await;

        let history = provenance.get_history("P-1", 0).await.unwrap();
        assert_eq!(history.len(), 1);
        let event = history[0].event().unwrap();
        assert_eq!(event.product_id, "P-1");
        assert_eq!(event.kind, EventKind::Created);
    }

    #[tokio::test]
    async fn history_retains_corrupt_entries_of_unknown_product() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let provenance = facade(log.clone(), registry);

        provenance
            .record_event("P-1", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();
        log.confirm_all().await;
        log.inject_raw_entry(b"not a valid envelope").await;

        let history = provenance.get_history("P-1", 0).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_corrupt());
    }

    #[tokio::test]
    async fn unknown_product_is_rejected_when_directory_attached() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let directory = Arc::new(StaticDirectory::new([ProductRecord {
            id: "P-1".to_string(),
            name: "Widget".to_string(),
            status: ProductStatus::Active,
        }]));
        let provenance = facade(log.clone(), registry).with_directory(directory);

        let err = provenance
            .record_event("P-404", EventKind::Created, created_payload("Ghost"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::UnknownProduct {
                product_id: "P-404".to_string()
            }
        );
        assert_eq!(log.pending_count().await, 0);
    }

    #[tokio::test]
    async fn sync_log_pointer_persists_highest_sequence() {
        let log = Arc::new(MemoryLog::new());
        let registry = Arc::new(MemoryRegistry::new());
        let directory = Arc::new(StaticDirectory::new([ProductRecord {
            id: "P-1".to_string(),
            name: "Widget".to_string(),
            status: ProductStatus::Active,
        }]));
        let provenance = facade(log.clone(), registry).with_directory(directory.clone());

        provenance
            .record_event("P-1", EventKind::Created, created_payload("Widget"))
            .await
            .unwrap();
        provenance
            .record_event("P-1", EventKind::StatusChanged, status_payload("suspended"))
            .await
            .unwrap();
        log.confirm_all().await;

        let latest = provenance.sync_log_pointer("P-1").await.unwrap();
        assert_eq!(latest, Some(2));
        assert_eq!(directory.log_pointer("P-1").await, Some(2));
    }
}
