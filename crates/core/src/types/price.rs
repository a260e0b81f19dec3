//! Catalog prices.
//!
//! All prices are in euros excluding VAT.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A net euro price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price after applying a discount, rounded to cents.
    #[must_use]
    pub fn discounted(&self, discount: super::Percentage) -> Self {
        let factor = Decimal::ONE - discount.as_decimal() / Decimal::ONE_HUNDRED;
        Self((self.0 * factor).round_dp(2))
    }

    /// Line total for `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

/// Formats as `€ 1.234,50`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "€ {sign}{grouped},{cents}")
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    /// Accepts `12,50` as well as `12.50`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(&s.trim().replace(',', ".")).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Percentage;

    #[test]
    fn test_display_dutch_format() {
        assert_eq!("12.5".parse::<Price>().unwrap().to_string(), "€ 12,50");
        assert_eq!("1234.5".parse::<Price>().unwrap().to_string(), "€ 1.234,50");
        assert_eq!("0".parse::<Price>().unwrap().to_string(), "€ 0,00");
    }

    #[test]
    fn test_discounted_rounds_to_cents() {
        let price: Price = "19,99".parse().unwrap();
        let discount: Percentage = "12,5".parse().unwrap();
        assert_eq!(price.discounted(discount), "17.49".parse().unwrap());
    }

    #[test]
    fn test_times() {
        let price: Price = "2,25".parse().unwrap();
        assert_eq!(price.times(4), "9".parse().unwrap());
    }
}
