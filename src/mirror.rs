//! Client-side cart mirror
//!
//! Best-effort local echo of the server ledger used for optimistic UI:
//! quantity steppers and the subtotal update instantly, then `reconcile`
//! replaces the lot with whatever the server actually committed. The mirror
//! is never consulted for server-side bound checks.
use crate::cart::{CartRecord, LineItem};
use crate::error::CartError;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct ClientMirror {
    id: Option<String>,
    items: CartRecord,
    // last known per-product availability, fed from rendered product pages
    known_inventory: BTreeMap<String, u64>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn items(&self) -> &CartRecord {
        &self.items
    }

    /// Record the availability shown for a product, first sighting wins.
    pub fn register_product(&mut self, slug: &str, available: u64) {
        self.known_inventory.entry(slug.to_owned()).or_insert(available);
    }

    pub fn product_quantity(&self, slug: &str) -> Result<u64, CartError> {
        self.known_inventory
            .get(slug)
            .copied()
            .ok_or(CartError::ProductNotFound)
    }

    /// Optimistically add an item, merging with an existing line. The bump
    /// is re-validated against the last known availability first.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), CartError> {
        let available = self.product_quantity(&item.slug)?;
        let current = self.items.get(&item.slug).map_or(0, |line| line.quantity);

        let combined = current.saturating_add(item.quantity);
        if combined > available {
            return Err(CartError::QuantityExceeded);
        }

        self.items.insert(
            item.slug.clone(),
            LineItem {
                quantity: combined,
                ..item
            },
        );

        Ok(())
    }

    /// Optimistic counterpart of the ledger's `update`; dropping the last
    /// unit removes the line.
    pub fn update_quantity(&mut self, slug: &str, delta: i64) -> Result<(), CartError> {
        let current = match self.items.get(slug) {
            None => return Err(CartError::ItemNotFound),
            Some(line) => line.quantity,
        };

        if current <= 1 && delta <= -1 {
            self.items.remove(slug);
            return Ok(());
        }

        let next = (current as i64).saturating_add(delta);

        if delta > 0 && next > self.product_quantity(slug)? as i64 {
            return Err(CartError::QuantityExceeded);
        }

        if next <= 0 {
            self.items.remove(slug);
        } else if let Some(line) = self.items.get_mut(slug) {
            line.quantity = next as u64;
        }

        Ok(())
    }

    /// Replace local state with the server's committed record.
    pub fn reconcile(&mut self, id: Option<String>, items: CartRecord) {
        self.id = id;
        self.items = items;
    }

    pub fn empty(&mut self) {
        self.items.clear();
    }

    pub fn subtotal(&self) -> u64 {
        self.items
            .values()
            .map(|line| line.price * line.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(slug: &str, price: u64, quantity: u64) -> LineItem {
        LineItem {
            slug: slug.into(),
            name: slug.to_uppercase(),
            price,
            quantity,
        }
    }

    #[test]
    fn add_merges_and_checks_known_inventory() {
        let mut mirror = ClientMirror::new();
        mirror.register_product("speaker-x", 3);

        mirror.add_item(line("speaker-x", 59_900, 2)).unwrap();
        assert!(matches!(
            mirror.add_item(line("speaker-x", 59_900, 2)),
            Err(CartError::QuantityExceeded)
        ));

        mirror.add_item(line("speaker-x", 59_900, 1)).unwrap();
        assert_eq!(mirror.items()["speaker-x"].quantity, 3);
    }

    #[test]
    fn hostile_quantity_does_not_overflow() {
        let mut mirror = ClientMirror::new();
        mirror.register_product("speaker-x", 3);
        mirror.add_item(line("speaker-x", 59_900, 2)).unwrap();

        // the bump saturates instead of wrapping, then fails the bound check
        assert!(matches!(
            mirror.add_item(line("speaker-x", 59_900, u64::MAX)),
            Err(CartError::QuantityExceeded)
        ));
        assert_eq!(mirror.items()["speaker-x"].quantity, 2);
    }

    #[test]
    fn unknown_product_is_rejected() {
        let mut mirror = ClientMirror::new();
        assert!(matches!(
            mirror.add_item(line("ghost", 100, 1)),
            Err(CartError::ProductNotFound)
        ));
    }

    #[test]
    fn stepper_removes_line_at_one() {
        let mut mirror = ClientMirror::new();
        mirror.register_product("earphone-y", 5);
        mirror.add_item(line("earphone-y", 9_900, 1)).unwrap();

        mirror.update_quantity("earphone-y", -1).unwrap();
        assert!(mirror.items().is_empty());

        assert!(matches!(
            mirror.update_quantity("earphone-y", -1),
            Err(CartError::ItemNotFound)
        ));
    }

    #[test]
    fn subtotal_sums_lines() {
        let mut mirror = ClientMirror::new();
        mirror.register_product("a", 10);
        mirror.register_product("b", 10);
        mirror.add_item(line("a", 1_000, 2)).unwrap();
        mirror.add_item(line("b", 2_500, 1)).unwrap();

        assert_eq!(mirror.subtotal(), 4_500);
    }

    #[test]
    fn reconcile_replaces_local_state() {
        let mut mirror = ClientMirror::new();
        mirror.register_product("a", 10);
        mirror.add_item(line("a", 1_000, 2)).unwrap();

        let mut server = CartRecord::new();
        server.insert("a".into(), line("a", 1_000, 1));
        mirror.reconcile(Some("cart_1abc".into()), server);

        assert_eq!(mirror.id(), Some("cart_1abc"));
        assert_eq!(mirror.items()["a"].quantity, 1);
    }
}
