//! Cart ledger
//!
//! The server-held cart: a per-session map of line items stored under a
//! derived key with a sliding expiration window. Every mutation re-reads the
//! inventory snapshot and bound-checks quantities against it. Updates go
//! through the store's conditional-write primitive so concurrent mutations
//! of the same cart cannot silently discard each other.
use crate::config::CartConfig;
use crate::error::{CartError, StoreError};
use crate::inventory::InventoryService;
use crate::keys::{Resource, derive_key};
use crate::store::{KvStore, encode};
use crate::utils;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A cart line. name/price are copied from the snapshot at add time and are
/// not live-linked to the catalog.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    #[n(0)]
    pub slug: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub price: u64,
    #[n(3)]
    pub quantity: u64,
}

pub type CartRecord = BTreeMap<String, LineItem>;

// attempts before a contended read-modify-write gives up
const CAS_ATTEMPTS: usize = 8;

pub struct CartService {
    store: Arc<dyn KvStore>,
    inventory: InventoryService,
    config: CartConfig,
}

impl CartService {
    pub fn new(store: Arc<dyn KvStore>, inventory: InventoryService, config: CartConfig) -> Self {
        Self {
            store,
            inventory,
            config,
        }
    }

    fn cart_key(&self, id: &str) -> String {
        derive_key(
            &self.config.namespace,
            self.config.environment,
            Resource::Cart,
            id,
        )
    }

    /// Add an item to a cart, minting a new cart when no identifier is given
    /// or the referenced cart has expired. Returns the cart identifier.
    ///
    /// When the line already exists the combined quantity must fit the
    /// snapshot, otherwise the add is rejected. A first add asking for more
    /// than is available is instead clamped to a single unit.
    pub fn add(&self, id: Option<&str>, slug: &str, quantity: u64) -> Result<String, CartError> {
        if quantity == 0 {
            return Err(CartError::ValidationViolation(
                "Quantity must be at least 1".into(),
            ));
        }

        let snapshot = self.inventory.load()?;
        let listing = snapshot.get(slug).ok_or(CartError::ProductNotFound)?;

        let (id, mut cart) = match id {
            None => (self.mint_id()?, CartRecord::new()),
            Some(id) => match self.store.get_versioned(&self.cart_key(id))? {
                Some((_, raw)) => (id.to_owned(), decode_cart(&raw)?),
                // key expired, start a new cart
                None => (self.mint_id()?, CartRecord::new()),
            },
        };

        let quantity = match cart.get(slug) {
            Some(line) if line.quantity.saturating_add(quantity) > listing.quantity => {
                return Err(CartError::QuantityExceeded);
            }
            Some(line) => line.quantity + quantity,
            None if quantity > listing.quantity => 1,
            None => quantity,
        };

        cart.insert(
            slug.to_owned(),
            LineItem {
                slug: slug.to_owned(),
                name: listing.name.clone(),
                price: listing.price,
                quantity,
            },
        );

        self.store
            .set_ex(&self.cart_key(&id), &encode(&cart)?, self.config.cart_ttl)?;

        Ok(id)
    }

    /// Apply a signed quantity delta to an existing line item.
    ///
    /// Decrementing the last unit removes the line entirely; a repeat of the
    /// same decrement then fails because the line no longer exists. The
    /// read-modify-write is conditional on the record not having changed
    /// underneath us and retries on contention.
    pub fn update(&self, id: &str, slug: &str, delta: i64) -> Result<(), CartError> {
        let snapshot = self.inventory.load()?;
        let key = self.cart_key(id);

        for _ in 0..CAS_ATTEMPTS {
            let Some((version, raw)) = self.store.get_versioned(&key)? else {
                return Err(CartError::CartNotFound);
            };
            let mut cart = decode_cart(&raw)?;

            let current = match cart.get(slug) {
                None => return Err(CartError::ItemNotFound),
                Some(line) => line.quantity,
            };

            if current <= 1 && delta <= -1 {
                cart.remove(slug);
            } else {
                let listing = snapshot.get(slug).ok_or(CartError::ProductNotFound)?;
                let next = (current as i64).saturating_add(delta);

                if next > listing.quantity as i64 {
                    return Err(CartError::QuantityExceeded);
                }

                if next <= 0 {
                    cart.remove(slug);
                } else if let Some(line) = cart.get_mut(slug) {
                    line.quantity = next as u64;
                }
            }

            if self
                .store
                .compare_and_swap_ex(&key, Some(&version), &encode(&cart)?, self.config.cart_ttl)?
            {
                return Ok(());
            }

            tracing::debug!(slug, "cart update lost a write race, retrying");
        }

        Err(StoreError::Contention.into())
    }

    /// All line items in the cart, refreshing its expiration window as a
    /// side effect. `None` means the cart is absent or expired, which is
    /// distinct from present-but-empty.
    pub fn get_all(&self, id: &str) -> Result<Option<CartRecord>, CartError> {
        match self.store.get_ex(&self.cart_key(id), self.config.cart_ttl)? {
            Some(raw) => Ok(Some(decode_cart(&raw)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the cart with an empty record. The key stays live with a
    /// refreshed window, so callers can still tell "emptied" from "expired".
    pub fn clear(&self, id: &str) -> Result<(), CartError> {
        let empty = CartRecord::new();
        self.store
            .set_ex(&self.cart_key(id), &encode(&empty)?, self.config.cart_ttl)?;
        Ok(())
    }

    fn mint_id(&self) -> Result<String, CartError> {
        utils::mint_cart_id().map_err(|err| CartError::Unknown(err.to_string()))
    }
}

fn decode_cart(raw: &[u8]) -> Result<CartRecord, CartError> {
    Ok(minicbor::decode(raw).map_err(StoreError::from)?)
}
