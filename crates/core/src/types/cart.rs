//! Session cart value object.
//!
//! The cart is an ordered set of lines, unique by product ID, held in the
//! user's server-side session. Handlers load it from the session, mutate it
//! through the methods here, and save it back - the cart itself does no I/O.

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A single cart line: a product reference and how many of it.
///
/// Invariant: `quantity` is always >= 1. Updates that would drive a line to
/// zero or below remove the line instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Number of units, always >= 1.
    pub quantity: u32,
}

/// An ordered shopping cart, unique by product ID.
///
/// Lines keep their insertion order so the cart renders (and checks out) in
/// the order the shopper added items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its line quantity is
    /// incremented; otherwise a new line is appended. A requested quantity of
    /// zero is treated as one so the line invariant holds. Stock limits are
    /// not checked here - that happens at checkout.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        let quantity = quantity.max(1);
        match self.line_mut(product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// A quantity of zero or below removes the line. Returns `false` if the
    /// product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        if self.line_mut(product_id).is_none() {
            return false;
        }

        if quantity <= 0 {
            self.remove(product_id);
        } else {
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            if let Some(line) = self.line_mut(product_id) {
                line.quantity = quantity;
            }
        }
        true
    }

    /// Remove a product's line. Idempotent.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Read-only snapshot of the lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// The distinct product IDs in the cart, in insertion order.
    ///
    /// Lines are already unique by product ID, so this is just a projection.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product_id).collect()
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const APPLE: ProductId = ProductId::new(1);
    const PEAR: ProductId = ProductId::new(2);

    #[test]
    fn test_add_new_line() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        assert_eq!(
            cart.lines(),
            &[CartLine {
                product_id: APPLE,
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = Cart::new();
        cart.add(APPLE, 1);
        cart.add(APPLE, 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_quantity(), 4);
    }

    #[test]
    fn test_add_zero_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(APPLE, 0);

        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new();
        cart.add(PEAR, 1);
        cart.add(APPLE, 1);
        cart.add(PEAR, 1);

        assert_eq!(cart.product_ids(), vec![PEAR, APPLE]);
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        assert!(cart.set_quantity(APPLE, 7));
        assert_eq!(cart.total_quantity(), 7);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        assert!(cart.set_quantity(APPLE, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_negative_removes_line() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        assert!(cart.set_quantity(APPLE, -5));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line_reports_failure() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        assert!(!cart.set_quantity(PEAR, 3));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);

        cart.remove(APPLE);
        cart.remove(APPLE);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);
        cart.add(PEAR, 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_no_line_ever_below_one() {
        // Invariant check across a mixed op sequence.
        let mut cart = Cart::new();
        cart.add(APPLE, 0);
        cart.add(PEAR, 3);
        cart.set_quantity(PEAR, -1);
        cart.set_quantity(APPLE, 5);
        cart.add(PEAR, 0);

        assert!(cart.lines().iter().all(|line| line.quantity >= 1));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::new();
        cart.add(APPLE, 2);
        cart.add(PEAR, 1);

        let json = serde_json::to_string(&cart).unwrap();
        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);
    }
}
