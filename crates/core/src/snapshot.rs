use serde::{Deserialize, Serialize};

use crate::event::ProductStatus;

/// The current on-chain view of one product.
///
/// A snapshot exists only after at least one successful create-on-registry
/// call. `timestamp` is the log-assigned time of the last registry write,
/// not a client clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub status: ProductStatus,
    /// RFC 3339 timestamp string.
    pub timestamp: String,
}
