//! Discount percentages.
//!
//! Percentages are written the Dutch way (`12,5`) in every customer-facing
//! file, and as a five digit fixed-point number (`01250`) in ICC files.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Why a percentage was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PercentageError {
    #[error("ongeldig percentage: {0}")]
    Invalid(String),
    #[error("percentage moet tussen 0 en 100 liggen")]
    OutOfRange,
}

/// A discount percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    /// Width of the ICC discount field.
    pub const ICC_WIDTH: usize = 5;

    /// Wrap a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `PercentageError::OutOfRange` for values below 0 or above 100.
    pub fn new(value: Decimal) -> Result<Self, PercentageError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PercentageError::OutOfRange);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// `12,5`, `5`, `33,33`: decimal comma, no trailing zeros.
    #[must_use]
    pub fn to_dutch(&self) -> String {
        self.0.normalize().to_string().replace('.', ",")
    }

    /// Three integer digits and two decimals without separator:
    /// `12,5` becomes `01250`.
    #[must_use]
    pub fn to_icc(&self) -> String {
        let hundredths = (self.0 * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .unwrap_or_default();
        format!("{hundredths:0width$}", width = Self::ICC_WIDTH)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_dutch())
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    /// Accepts both `12,5` and `12.5`, with an optional trailing `%`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().trim_end_matches('%').trim().replace(',', ".");
        let value =
            Decimal::from_str(&cleaned).map_err(|_| PercentageError::Invalid(s.to_owned()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = PercentageError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pct(s: &str) -> Percentage {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_comma_and_dot() {
        assert_eq!(pct("12,5"), pct("12.5"));
        assert_eq!(pct("12,5%"), pct("12.50"));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!("100,01".parse::<Percentage>(), Err(PercentageError::OutOfRange));
        assert_eq!("-1".parse::<Percentage>(), Err(PercentageError::OutOfRange));
        assert!(matches!(
            "twaalf".parse::<Percentage>(),
            Err(PercentageError::Invalid(_))
        ));
    }

    #[test]
    fn test_dutch_notation_drops_trailing_zeros() {
        assert_eq!(pct("12.50").to_dutch(), "12,5");
        assert_eq!(pct("5.00").to_dutch(), "5");
        assert_eq!(pct("33,33").to_dutch(), "33,33");
        assert_eq!(pct("0").to_dutch(), "0");
    }

    #[test]
    fn test_icc_notation_is_fixed_point() {
        assert_eq!(pct("12,5").to_icc(), "01250");
        assert_eq!(pct("5").to_icc(), "00500");
        assert_eq!(pct("100").to_icc(), "10000");
        assert_eq!(pct("0").to_icc(), "00000");
        assert_eq!(pct("33,333").to_icc(), "03333");
    }

    #[test]
    fn test_display_appends_percent_sign() {
        assert_eq!(pct("12,5").to_string(), "12,5%");
    }
}
