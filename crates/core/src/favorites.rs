//! The per-user favorites list.
//!
//! Stored on the user row as a JSON array of product numbers, in the order
//! they were added.

use serde::{Deserialize, Serialize};

use crate::types::ProductNumber;

/// Outcome of [`Favorites::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(Vec<ProductNumber>);

impl Favorites {
    /// Remove `product` if present, append it otherwise.
    pub fn toggle(&mut self, product: ProductNumber) -> Toggle {
        if let Some(index) = self.0.iter().position(|p| *p == product) {
            self.0.remove(index);
            Toggle::Removed
        } else {
            self.0.push(product);
            Toggle::Added
        }
    }

    #[must_use]
    pub fn contains(&self, product: &ProductNumber) -> bool {
        self.0.contains(product)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductNumber> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ProductNumber>> for Favorites {
    fn from(products: Vec<ProductNumber>) -> Self {
        Self(products)
    }
}

impl<'a> IntoIterator for &'a Favorites {
    type Item = &'a ProductNumber;
    type IntoIter = std::slice::Iter<'a, ProductNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(s: &str) -> ProductNumber {
        ProductNumber::parse(s).unwrap()
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut favorites = Favorites::from(vec![product("1111111")]);
        let before = favorites.clone();

        assert_eq!(favorites.toggle(product("2222222")), Toggle::Added);
        assert!(favorites.contains(&product("2222222")));
        assert_eq!(favorites.toggle(product("2222222")), Toggle::Removed);

        assert_eq!(favorites, before);
    }

    #[test]
    fn test_toggle_keeps_order_of_others() {
        let mut favorites = Favorites::from(vec![
            product("1111111"),
            product("2222222"),
            product("3333333"),
        ]);

        favorites.toggle(product("2222222"));

        let left: Vec<_> = favorites.iter().map(ProductNumber::as_str).collect();
        assert_eq!(left, vec!["1111111", "3333333"]);
    }

    #[test]
    fn test_serializes_as_json_array() {
        let favorites = Favorites::from(vec![product("0012345")]);
        let json = serde_json::to_string(&favorites).unwrap();
        assert_eq!(json, r#"["0012345"]"#);

        let back: Favorites = serde_json::from_str(&json).unwrap();
        assert_eq!(back, favorites);
    }

    #[test]
    fn test_invalid_stored_numbers_are_rejected() {
        assert!(serde_json::from_str::<Favorites>(r#"["12"]"#).is_err());
    }
}
