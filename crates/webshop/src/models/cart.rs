//! The shopping cart.
//!
//! Lives in the session until the order is placed; prices are looked up
//! again when the cart is rendered, so only what is needed to rebuild the
//! order is stored.

use serde::{Deserialize, Serialize};

use wtg_core::ProductNumber;

use super::OrderLine;

/// Largest quantity accepted for a single line.
pub const MAX_QUANTITY: u32 = 9_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductNumber,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a product, merging with an existing line.
    pub fn add(&mut self, product: ProductNumber, name: String, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product == product) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_QUANTITY);
        } else {
            self.lines.push(CartLine {
                product,
                name,
                quantity: quantity.min(MAX_QUANTITY),
            });
        }
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn update(&mut self, product: &ProductNumber, quantity: u32) -> bool {
        let Some(index) = self.lines.iter().position(|l| &l.product == product) else {
            return false;
        };
        if quantity == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = quantity.min(MAX_QUANTITY);
        }
        true
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of items.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Snapshot for the order table.
    #[must_use]
    pub fn to_order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|l| OrderLine {
                product: l.product.clone(),
                name: l.name.clone(),
                quantity: l.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn number(s: &str) -> ProductNumber {
        ProductNumber::parse(s).unwrap()
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        cart.add(number("1234567"), "Buis".to_owned(), 2);
        cart.add(number("1234567"), "Buis".to_owned(), 3);
        cart.add(number("7654321"), "Bocht".to_owned(), 1);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_add_zero_is_ignored() {
        let mut cart = Cart::default();
        cart.add(number("1234567"), "Buis".to_owned(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(number("1234567"), "Buis".to_owned(), 2);

        assert!(cart.update(&number("1234567"), 0));
        assert!(cart.is_empty());
        assert!(!cart.update(&number("1234567"), 4));
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::default();
        cart.add(number("1234567"), "Buis".to_owned(), MAX_QUANTITY);
        cart.add(number("1234567"), "Buis".to_owned(), 10);
        assert_eq!(cart.count(), MAX_QUANTITY);
    }

    #[test]
    fn test_order_snapshot() {
        let mut cart = Cart::default();
        cart.add(number("1234567"), "Buis".to_owned(), 2);

        assert_eq!(
            cart.to_order_lines(),
            vec![OrderLine {
                product: number("1234567"),
                name: "Buis".to_owned(),
                quantity: 2,
            }]
        );
    }
}
