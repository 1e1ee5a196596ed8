//! Relational-store collaborator seam.
//!
//! The core consumes the primary store through this narrow trait only:
//! fetch a product row, persist a derived log-pointer. The store's schema
//! and everything else about it are out of scope.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use provenant_core::ProductStatus;

/// The slice of a product row this core reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub status: ProductStatus,
}

/// Errors from the product directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("product '{product_id}' not found")]
    ProductNotFound { product_id: String },

    #[error("directory backend error: {0}")]
    Backend(String),
}

/// Read/annotate access to the primary relational store.
#[async_trait]
pub trait ProductDirectory: Send + Sync {
    /// Fetch a product row by external id.
    async fn get_product(&self, product_id: &str) -> Result<ProductRecord, DirectoryError>;

    /// Persist the highest confirmed sequence number observed for a
    /// product, as an audit pointer back into the relational store.
    async fn persist_log_pointer(
        &self,
        product_id: &str,
        sequence_number: u64,
    ) -> Result<(), DirectoryError>;
}

/// A directory over a fixed set of products, for tests and scenarios where
/// the product inventory is known ahead of time.
#[derive(Default)]
pub struct StaticDirectory {
    products: HashMap<String, ProductRecord>,
    pointers: Mutex<HashMap<String, u64>>,
}

impl StaticDirectory {
    pub fn new(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        StaticDirectory {
            products: products
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            pointers: Mutex::new(HashMap::new()),
        }
    }

    /// The last pointer persisted for a product, if any.
    pub async fn log_pointer(&self, product_id: &str) -> Option<u64> {
        self.pointers.lock().await.get(product_id).copied()
    }
}

#[async_trait]
impl ProductDirectory for StaticDirectory {
    async fn get_product(&self, product_id: &str) -> Result<ProductRecord, DirectoryError> {
        self.products
            .get(product_id)
            .cloned()
            .ok_or_else(|| DirectoryError::ProductNotFound {
                product_id: product_id.to_string(),
            })
    }

    async fn persist_log_pointer(
        &self,
        product_id: &str,
        sequence_number: u64,
    ) -> Result<(), DirectoryError> {
        self.pointers
            .lock()
            .await
            .insert(product_id.to_string(), sequence_number);
        Ok(())
    }
}
