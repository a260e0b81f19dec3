//! Product numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a product number was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductNumberError {
    #[error("productnummer moet uit precies {len} cijfers bestaan")]
    InvalidFormat { len: usize },
}

/// A catalog product number: exactly seven ASCII digits, e.g. `1234567`.
///
/// Leading zeros are significant, so the number is kept as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ProductNumber(String);

impl ProductNumber {
    pub const LENGTH: usize = 7;

    /// Parse a product number.
    ///
    /// # Errors
    ///
    /// Returns `ProductNumberError::InvalidFormat` unless the trimmed input is
    /// exactly seven digits.
    pub fn parse(s: &str) -> Result<Self, ProductNumberError> {
        let s = s.trim();
        if s.len() != Self::LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProductNumberError::InvalidFormat { len: Self::LENGTH });
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProductNumber {
    type Err = ProductNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductNumber {
    type Error = ProductNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductNumber> for String {
    fn from(number: ProductNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seven_digits() {
        assert_eq!(
            ProductNumber::parse("0012345").map(|p| p.to_string()),
            Ok("0012345".to_owned())
        );
    }

    #[test]
    fn test_parse_rejects_wrong_length_or_letters() {
        for input in ["", "123456", "12345678", "12345a7", "123 567"] {
            assert!(ProductNumber::parse(input).is_err(), "{input:?} accepted");
        }
    }
}
