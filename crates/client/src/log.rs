//! Consensus log client: channel lifecycle and event submission.
//!
//! The channel state machine is `Uninitialized -> Creating -> Ready`. The
//! whole deployment shares one channel, so the `Uninitialized -> Creating`
//! transition is guarded: exactly one caller issues the create call while
//! every concurrent caller awaits that in-flight attempt's outcome over a
//! watch channel. On failure the state reverts to `Uninitialized` so a
//! later caller may retry; on success all callers converge on the winning
//! id and it is reused for the life of the process.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use provenant_core::{content_hash, ChannelId, SubmissionId};

use crate::transport::LogTransport;

/// Errors from the consensus log client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Channel creation failed. Retryable with backoff; a retry goes back
    /// through the same guarded transition, so it can never silently spawn
    /// a duplicate channel.
    #[error("channel creation failed: {reason}")]
    ChannelCreationFailed { reason: String },

    /// The log rejected the submission or the call failed. Retrying is the
    /// caller's decision: the submission id is a content hash, so a
    /// downstream consumer can deduplicate a retried submission.
    #[error("submission {submission_id} failed: {reason}")]
    SubmissionFailed {
        submission_id: String,
        reason: String,
    },
}

type CreationOutcome = Option<Result<ChannelId, LogError>>;

enum ChannelState {
    Uninitialized,
    /// A creation attempt is in flight; waiters subscribe to its outcome.
    Creating(watch::Receiver<CreationOutcome>),
    Ready(ChannelId),
}

/// Client owning the lifecycle of the deployment's single log channel.
pub struct ConsensusLogClient {
    transport: Arc<dyn LogTransport>,
    state: Mutex<ChannelState>,
}

impl ConsensusLogClient {
    pub fn new(transport: Arc<dyn LogTransport>) -> Self {
        ConsensusLogClient {
            transport,
            state: Mutex::new(ChannelState::Uninitialized),
        }
    }

    /// Construct with a pre-existing channel id (configuration override).
    /// `ensure_channel` then short-circuits without ever calling create.
    pub fn with_channel(transport: Arc<dyn LogTransport>, channel: ChannelId) -> Self {
        ConsensusLogClient {
            transport,
            state: Mutex::new(ChannelState::Ready(channel)),
        }
    }

    /// Return the channel id, creating the channel exactly once.
    ///
    /// Concurrent first-time callers converge: one issues the create call,
    /// the rest await the same in-flight attempt. A failed attempt is
    /// broadcast to every waiter and resets the state so a later call may
    /// retry.
    pub async fn ensure_channel(&self) -> Result<ChannelId, LogError> {
        let mut rx = {
            let mut state = self.state.lock().await;
            match &*state {
                ChannelState::Ready(id) => return Ok(id.clone()),
                ChannelState::Creating(rx) => rx.clone(),
                ChannelState::Uninitialized => {
                    let (tx, rx) = watch::channel(None);
                    *state = ChannelState::Creating(rx);
                    drop(state);
                    return self.create_as_leader(tx).await;
                }
            }
        };

        // Await the leader's outcome. The watch retains the last published
        // value, so a waiter arriving after the send still observes it.
        loop {
            let outcome = rx.borrow_and_update().clone();
            if let Some(outcome) = outcome {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // The leader was cancelled before publishing. Reset the
                // state so a later caller may retry, unless a new attempt
                // already replaced this one.
                let mut state = self.state.lock().await;
                if let ChannelState::Creating(current) = &*state {
                    if current.same_channel(&rx) {
                        *state = ChannelState::Uninitialized;
                    }
                }
                return Err(LogError::ChannelCreationFailed {
                    reason: "in-flight creation was cancelled".to_string(),
                });
            }
        }
    }

    async fn create_as_leader(
        &self,
        tx: watch::Sender<CreationOutcome>,
    ) -> Result<ChannelId, LogError> {
        let outcome = self
            .transport
            .create_channel()
            .await
            .map_err(|e| LogError::ChannelCreationFailed {
                reason: e.to_string(),
            });

        let mut state = self.state.lock().await;
        match &outcome {
            Ok(id) => {
                debug!(channel = %id, "log channel created");
                *state = ChannelState::Ready(id.clone());
            }
            Err(err) => {
                warn!(error = %err, "log channel creation failed");
                *state = ChannelState::Uninitialized;
            }
        }
        drop(state);

        // Waiters that already dropped out are fine with a failed send.
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    /// Submit an encoded event for ordering.
    ///
    /// Returns once the log ACCEPTS the submission — not once it is
    /// finalized; finality is only observable through the mirror. The
    /// returned submission id is the payload's content hash. This layer
    /// never retries a submission, cancelled or otherwise.
    pub async fn submit(
        &self,
        channel: &ChannelId,
        payload: &[u8],
    ) -> Result<SubmissionId, LogError> {
        let submission_id = content_hash(payload);

        let receipt = self
            .transport
            .submit(channel, payload, &submission_id)
            .await
            .map_err(|e| LogError::SubmissionFailed {
                submission_id: submission_id.clone(),
                reason: e.to_string(),
            })?;

        if !receipt.accepted {
            return Err(LogError::SubmissionFailed {
                submission_id,
                reason: "log rejected the submission".to_string(),
            });
        }

        debug!(channel = %channel, submission_id = %receipt.submission_id, "submission accepted for ordering");
        Ok(receipt.submission_id)
    }
}
