//! Inventory snapshot
//!
//! The product store keeps one inventory row per physical unit. The snapshot
//! folds those rows into a per-product listing (name, price, available
//! quantity) and caches the result in the shared store under a fixed key.
//! It is a point-in-time read: cart operations only consult it for bound
//! checks and never decrement it.
use crate::config::CartConfig;
use crate::error::StoreError;
use crate::store::{KvStore, encode};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-product snapshot entry. Prices are integer minor units.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub price: u64,
    #[n(2)]
    pub quantity: u64,
}

pub type InventorySnapshot = BTreeMap<String, Listing>;

/// One raw row from the inventory/product join, one per physical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInventoryRecord {
    pub slug: String,
    pub name: String,
    pub price: u64,
}

/// Seam to the relational product store. The join itself is external; this
/// core only needs the flattened rows.
pub trait InventoryReader: Send + Sync {
    fn raw_records(&self) -> anyhow::Result<Vec<RawInventoryRecord>>;
}

impl InventoryReader for Vec<RawInventoryRecord> {
    fn raw_records(&self) -> anyhow::Result<Vec<RawInventoryRecord>> {
        Ok(self.clone())
    }
}

pub struct InventoryService {
    store: Arc<dyn KvStore>,
    reader: Arc<dyn InventoryReader>,
    inventory_key: String,
}

impl InventoryService {
    pub fn new(store: Arc<dyn KvStore>, reader: Arc<dyn InventoryReader>, config: &CartConfig) -> Self {
        Self {
            store,
            reader,
            inventory_key: config.inventory_key(),
        }
    }

    /// Return the cached snapshot, building it from raw records on a miss.
    /// The cached copy has no expiration tied to cart TTLs; it lives until
    /// someone removes or overwrites it.
    pub fn load(&self) -> Result<InventorySnapshot, StoreError> {
        if let Some(raw) = self.store.get(&self.inventory_key)? {
            return Ok(minicbor::decode(&raw)?);
        }

        tracing::debug!(key = %self.inventory_key, "rebuilding inventory snapshot");

        let records = self
            .reader
            .raw_records()
            .map_err(|err| StoreError::Upstream(err.to_string()))?;

        let mut snapshot = InventorySnapshot::new();
        for record in records {
            snapshot
                .entry(record.slug)
                .and_modify(|listing| listing.quantity += 1)
                .or_insert(Listing {
                    name: record.name,
                    price: record.price,
                    quantity: 1,
                });
        }

        self.store.set(&self.inventory_key, &encode(&snapshot)?)?;

        Ok(snapshot)
    }
}
