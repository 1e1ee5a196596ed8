//! State registry client.
//!
//! Wraps the on-chain contract registry's three named calls. The
//! confirmation receipt is the authority on whether a write happened:
//! a call that returns without a transport error but carries a reverted
//! receipt is a failed write, and the client never assumes a failed write
//! partially applied.

use std::sync::Arc;

use tracing::debug;

use provenant_core::{ProductStatus, StateSnapshot};

use crate::transport::{ReceiptStatus, RegistryTransport, ResourceBudget, SnapshotFields};

/// Errors from the state registry client. `NotFound` is logical (the
/// product has no registry record); the others are call failures,
/// distinguishable by type rather than by message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The call reverted or the receipt reported non-success.
    #[error("registry write failed for '{product_id}': {reason}")]
    WriteFailed { product_id: String, reason: String },

    /// A read-only query failed (network, malformed response, bad status
    /// value). Distinct from "no record", which is `Ok(None)` on `query`.
    #[error("registry read failed for '{product_id}': {reason}")]
    ReadFailed { product_id: String, reason: String },

    /// The call exceeded its resource budget. Distinct from a logical
    /// revert: raising the budget may make the same call succeed.
    #[error("registry call for '{product_id}' exhausted its budget of {limit}")]
    ResourceExhausted { product_id: String, limit: u64 },

    /// The product id has no registry record (e.g. update before create).
    #[error("product '{product_id}' has no registry record")]
    NotFound { product_id: String },
}

/// Client over the on-chain registry's create/update/query calls.
pub struct StateRegistryClient {
    transport: Arc<dyn RegistryTransport>,
    /// Budget applied to every call.
    pub budget: ResourceBudget,
}

impl StateRegistryClient {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        StateRegistryClient {
            transport,
            budget: ResourceBudget::default(),
        }
    }

    pub fn with_budget(transport: Arc<dyn RegistryTransport>, budget: ResourceBudget) -> Self {
        StateRegistryClient { transport, budget }
    }

    /// Create a product's registry record. The record exists only once the
    /// receipt reports success.
    pub async fn create(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: ProductStatus,
    ) -> Result<(), RegistryError> {
        let receipt = self
            .transport
            .create(product_id, name, description, status.as_str(), self.budget)
            .await
            .map_err(|e| RegistryError::WriteFailed {
                product_id: product_id.to_string(),
                reason: e.to_string(),
            })?;

        self.check_receipt(product_id, "create", receipt.status)
    }

    /// Update a product's registry record. Updating a never-created id is
    /// reported by the contract as `NotFound` — no implicit create.
    pub async fn update(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: ProductStatus,
    ) -> Result<(), RegistryError> {
        let receipt = self
            .transport
            .update(product_id, name, description, status.as_str(), self.budget)
            .await
            .map_err(|e| RegistryError::WriteFailed {
                product_id: product_id.to_string(),
                reason: e.to_string(),
            })?;

        self.check_receipt(product_id, "update", receipt.status)
    }

    /// Query the current snapshot. `Ok(None)` when the registry has no
    /// record — NOT an error; an unreachable registry is `Err(ReadFailed)`.
    pub async fn query(&self, product_id: &str) -> Result<Option<StateSnapshot>, RegistryError> {
        let fields = self
            .transport
            .query(product_id, self.budget)
            .await
            .map_err(|e| RegistryError::ReadFailed {
                product_id: product_id.to_string(),
                reason: e.to_string(),
            })?;

        match fields {
            None => Ok(None),
            Some(fields) => {
                let snapshot = decode_snapshot(product_id, fields).map_err(|reason| {
                    RegistryError::ReadFailed {
                        product_id: product_id.to_string(),
                        reason,
                    }
                })?;
                Ok(Some(snapshot))
            }
        }
    }

    fn check_receipt(
        &self,
        product_id: &str,
        function: &str,
        status: ReceiptStatus,
    ) -> Result<(), RegistryError> {
        match status {
            ReceiptStatus::Success => {
                debug!(product_id, function, "registry write confirmed");
                Ok(())
            }
            ReceiptStatus::Reverted => Err(RegistryError::WriteFailed {
                product_id: product_id.to_string(),
                reason: format!("{} reverted", function),
            }),
            ReceiptStatus::NotFound => Err(RegistryError::NotFound {
                product_id: product_id.to_string(),
            }),
            ReceiptStatus::ResourceExhausted => Err(RegistryError::ResourceExhausted {
                product_id: product_id.to_string(),
                limit: self.budget.limit,
            }),
        }
    }
}

fn decode_snapshot(product_id: &str, fields: SnapshotFields) -> Result<StateSnapshot, String> {
    let status = ProductStatus::parse(&fields.status)
        .ok_or_else(|| format!("unknown status '{}' in registry record", fields.status))?;

    Ok(StateSnapshot {
        product_id: product_id.to_string(),
        name: fields.name,
        description: fields.description,
        status,
        timestamp: fields.timestamp,
    })
}
