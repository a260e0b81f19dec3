//! Catalog products.

use wtg_core::{Percentage, Price, ProductNumber};

/// A product as imported from the ERP export.
#[derive(Debug, Clone)]
pub struct Product {
    pub number: ProductNumber,
    pub name: String,
    pub series: String,
    /// Product group code, matched against group discounts.
    pub group: String,
    pub price: Price,
    pub special: bool,
    pub clearance: bool,
}

impl Product {
    /// Net price for a customer with the given discount.
    #[must_use]
    pub fn net_price(&self, discount: Option<Percentage>) -> Price {
        discount.map_or(self.price, |d| self.price.discounted(d))
    }
}
