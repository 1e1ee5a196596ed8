//! Mirror reconciliation reader.
//!
//! Polls the replica for a channel's confirmed messages, page by page.
//! Decoding is defensive: an entry that fails base64 or codec decode
//! becomes a corrupt marker carrying the entry's own sequence number and
//! timestamp, and the rest of the page is still processed — auditors see
//! every confirmed sequence number, readable or not.
//!
//! Ordering is by `sequence_number` ascending, the log's own order. The
//! reader never re-orders by client-observed time.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::warn;

use provenant_core::{decode, ChannelId, CorruptMarker, Decoded, EntryBody, LogEntry};

use crate::retry::RetryPolicy;
use crate::transport::{MirrorEntry, MirrorTransport};

/// Default page size for replica fetches.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Errors from the mirror reader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MirrorError {
    /// The replica could not be reached or answered abnormally. Retryable.
    #[error("replica unavailable: {reason}")]
    Unavailable { reason: String },

    /// The retry budget ran out without a successful fetch.
    #[error("replica still unavailable after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },
}

/// One decoded page of channel history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<LogEntry>,
    /// Cursor for the next page; `None` when this page is the last.
    pub next_cursor: Option<String>,
}

/// Reader over the replica's view of the log channel.
///
/// `page_size` is a hard cap on entries held in memory per fetch; a caller
/// wanting full history advances a cursor across repeated calls rather than
/// issuing one unbounded fetch.
pub struct MirrorReader {
    transport: Arc<dyn MirrorTransport>,
    pub page_size: u32,
    pub retry: RetryPolicy,
}

impl MirrorReader {
    pub fn new(transport: Arc<dyn MirrorTransport>) -> Self {
        MirrorReader {
            transport,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
        }
    }

    /// Fetch and decode a single page. No retry at this level: a transport
    /// failure maps to [`MirrorError::Unavailable`] and the caller decides.
    ///
    /// An empty page is a normal result — the channel simply has no
    /// confirmed messages (yet) past the cursor.
    pub async fn fetch_page(
        &self,
        channel: &ChannelId,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, MirrorError> {
        let page = self
            .transport
            .fetch_page(channel, cursor, self.page_size)
            .await
            .map_err(|e| MirrorError::Unavailable {
                reason: e.to_string(),
            })?;

        Ok(HistoryPage {
            entries: page.entries.iter().map(decode_entry).collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Fetch the channel's confirmed history, ordered by sequence number
    /// ascending, up to `limit` entries (0 = no limit).
    ///
    /// Pages are fetched one at a time; each page gets up to
    /// `retry.max_attempts` tries with exponential backoff and jitter
    /// before the whole call fails with [`MirrorError::Exhausted`].
    pub async fn fetch_history(
        &self,
        channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<LogEntry>, MirrorError> {
        let mut entries: Vec<LogEntry> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page_with_retry(channel, cursor.as_deref()).await?;
            let page_was_empty = page.entries.is_empty();
            entries.extend(page.entries);

            if limit != 0 && entries.len() >= limit {
                entries.truncate(limit);
                break;
            }
            match page.next_cursor {
                Some(next) if !page_was_empty => cursor = Some(next),
                _ => break,
            }
        }

        // The log's own order. Stable, so corrupt entries keep their place
        // among any equal sequence numbers a buggy replica might serve.
        entries.sort_by_key(|entry| entry.sequence_number);
        Ok(entries)
    }

    async fn fetch_page_with_retry(
        &self,
        channel: &ChannelId,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, MirrorError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_page(channel, cursor).await {
                Ok(page) => return Ok(page),
                Err(MirrorError::Unavailable { reason }) => {
                    if attempt >= max_attempts {
                        return Err(MirrorError::Exhausted {
                            attempts: attempt,
                            reason,
                        });
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, ?delay, reason = %reason, "replica fetch failed, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

/// Decode one wire entry, preserving the replica's sequence number and
/// consensus timestamp even when the payload is unreadable.
fn decode_entry(wire: &MirrorEntry) -> LogEntry {
    let body = match BASE64.decode(&wire.payload_b64) {
        Ok(bytes) => match decode(&bytes) {
            Decoded::Event(event) => EntryBody::Event(event),
            Decoded::Corrupt(marker) => EntryBody::Corrupt(marker),
        },
        Err(e) => EntryBody::Corrupt(CorruptMarker {
            raw_len: wire.payload_b64.len(),
            reason: format!("invalid base64: {}", e),
        }),
    };

    LogEntry {
        sequence_number: wire.sequence_number,
        consensus_timestamp: wire.consensus_timestamp.clone(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provenant_core::{encode, EventKind, ProvenanceEvent};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::transport::{MirrorPage, TransportError};

    fn encoded_event(product_id: &str) -> String {
        let event = ProvenanceEvent::new(
            product_id,
            EventKind::Created,
            BTreeMap::new(),
            "2026-03-01T12:00:00Z",
        );
        BASE64.encode(encode(&event).unwrap())
    }

    fn wire_entry(seq: u64, payload_b64: &str) -> MirrorEntry {
        MirrorEntry {
            sequence_number: seq,
            consensus_timestamp: format!("2026-03-01T12:00:0{}Z", seq % 10),
            payload_b64: payload_b64.to_string(),
        }
    }

    /// Serves fixed pages, failing the first `outages` fetches.
    struct FakeMirror {
        pages: Vec<MirrorPage>,
        outages: AtomicU32,
        fetches: AtomicU32,
    }

    impl FakeMirror {
        fn new(pages: Vec<MirrorPage>) -> Self {
            FakeMirror {
                pages,
                outages: AtomicU32::new(0),
                fetches: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MirrorTransport for FakeMirror {
        async fn fetch_page(
            &self,
            _channel: &ChannelId,
            cursor: Option<&str>,
            _page_size: u32,
        ) -> Result<MirrorPage, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.outages.load(Ordering::SeqCst) > 0 {
                self.outages.fetch_sub(1, Ordering::SeqCst);
                return Err(TransportError::Connect("simulated outage".to_string()));
            }
            let index: usize = cursor.map_or(0, |c| c.parse().unwrap());
            Ok(self.pages.get(index).cloned().unwrap_or(MirrorPage {
                entries: vec![],
                next_cursor: None,
            }))
        }
    }

    fn fast_reader(transport: Arc<dyn MirrorTransport>) -> MirrorReader {
        let mut reader = MirrorReader::new(transport);
        reader.retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        reader
    }

    #[tokio::test]
    async fn empty_channel_yields_empty_history() {
        let fake = Arc::new(FakeMirror::new(vec![]));
        let reader = fast_reader(fake);

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_preserved_in_place() {
        let fake = Arc::new(FakeMirror::new(vec![MirrorPage {
            entries: vec![
                wire_entry(1, &encoded_event("P-1")),
                wire_entry(2, &encoded_event("P-1")),
                wire_entry(3, "%%% not base64 %%%"),
                wire_entry(4, &encoded_event("P-2")),
                wire_entry(5, &encoded_event("P-1")),
            ],
            next_cursor: None,
        }]));
        let reader = fast_reader(fake);

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap();

        assert_eq!(history.len(), 5);
        assert!(history[2].is_corrupt());
        assert_eq!(history[2].sequence_number, 3);
        assert_eq!(history.iter().filter(|e| e.is_corrupt()).count(), 1);
    }

    #[tokio::test]
    async fn truncated_payload_is_corrupt_not_dropped() {
        let full = encoded_event("P-1");
        let truncated = BASE64.encode(&BASE64.decode(&full).unwrap()[..10]);
        let fake = Arc::new(FakeMirror::new(vec![MirrorPage {
            entries: vec![wire_entry(1, &truncated)],
            next_cursor: None,
        }]));
        let reader = fast_reader(fake);

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_corrupt());
    }

    #[tokio::test]
    async fn history_is_ordered_across_pages() {
        // Replica serves pages whose internal order is scrambled.
        let fake = Arc::new(FakeMirror::new(vec![
            MirrorPage {
                entries: vec![
                    wire_entry(2, &encoded_event("P-1")),
                    wire_entry(1, &encoded_event("P-1")),
                ],
                next_cursor: Some("1".to_string()),
            },
            MirrorPage {
                entries: vec![
                    wire_entry(4, &encoded_event("P-1")),
                    wire_entry(3, &encoded_event("P-1")),
                ],
                next_cursor: None,
            },
        ]));
        let reader = fast_reader(fake);

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap();
        let sequences: Vec<u64> = history.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn limit_caps_history_length() {
        let fake = Arc::new(FakeMirror::new(vec![MirrorPage {
            entries: (1..=5).map(|i| wire_entry(i, &encoded_event("P-1"))).collect(),
            next_cursor: None,
        }]));
        let reader = fast_reader(fake);

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 3)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_outages() {
        let entries = vec![wire_entry(1, &encoded_event("P-1"))];
        let fake = Arc::new(FakeMirror {
            pages: vec![MirrorPage {
                entries: entries.clone(),
                next_cursor: None,
            }],
            outages: AtomicU32::new(2),
            fetches: AtomicU32::new(0),
        });
        let reader = fast_reader(fake.clone());

        let history = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(fake.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_is_typed() {
        let fake = Arc::new(FakeMirror {
            pages: vec![],
            outages: AtomicU32::new(10),
            fetches: AtomicU32::new(0),
        });
        let reader = fast_reader(fake);

        let err = reader
            .fetch_history(&ChannelId::from("chan"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Exhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn single_page_fetch_does_not_retry() {
        let fake = Arc::new(FakeMirror {
            pages: vec![],
            outages: AtomicU32::new(1),
            fetches: AtomicU32::new(0),
        });
        let reader = fast_reader(fake.clone());

        let err = reader
            .fetch_page(&ChannelId::from("chan"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Unavailable { .. }));
        assert_eq!(fake.fetches.load(Ordering::SeqCst), 1);
    }
}
