//! Discount tiers and their precedence.
//!
//! Discounts arrive from the ERP in four tables. Two of them are per customer
//! and override their global counterpart for the same code:
//!
//! | table    | tier           | owner    | overridden by     |
//! |----------|----------------|----------|-------------------|
//! | `VA-220` | group-bound    | customer | -                 |
//! | `VA-221` | default        | global   | customer `VA-220` |
//! | `VA-261` | global-product | global   | customer `VA-260` |
//! | `VA-260` | product-bound  | customer | -                 |
//!
//! [`DiscountSheet::resolve`] applies these rules and yields the rows in the
//! order they are written to ICC and CSV files.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Login, Percentage};

/// Group description the ERP uses for discontinued groups.
pub const EXPIRED_GROUP: &str = "Vervallen";

/// One of the four discount tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscountTable {
    /// `VA-220`: customer specific discount on a product group.
    #[serde(rename = "VA-220")]
    GroupBound,
    /// `VA-221`: standard discount on a product group.
    #[serde(rename = "VA-221")]
    Default,
    /// `VA-261`: standard discount on a single product.
    #[serde(rename = "VA-261")]
    GlobalProduct,
    /// `VA-260`: customer specific discount on a single product.
    #[serde(rename = "VA-260")]
    ProductBound,
}

impl DiscountTable {
    /// Export order of the tiers.
    pub const EXPORT_ORDER: [Self; 4] = [
        Self::GroupBound,
        Self::Default,
        Self::GlobalProduct,
        Self::ProductBound,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::GroupBound => "VA-220",
            Self::Default => "VA-221",
            Self::GlobalProduct => "VA-261",
            Self::ProductBound => "VA-260",
        }
    }

    /// Group tiers discount a product group, the others a single product.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::GroupBound | Self::Default)
    }

    /// Customer tiers only apply to the customer owning the row.
    #[must_use]
    pub const fn is_customer_bound(self) -> bool {
        matches!(self, Self::GroupBound | Self::ProductBound)
    }

    /// The customer tier that overrides this global tier, if any.
    #[must_use]
    pub const fn overridden_by(self) -> Option<Self> {
        match self {
            Self::Default => Some(Self::GroupBound),
            Self::GlobalProduct => Some(Self::ProductBound),
            Self::GroupBound | Self::ProductBound => None,
        }
    }
}

impl fmt::Display for DiscountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unknown discount table code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("onbekende kortingstabel: {0}")]
pub struct UnknownTable(pub String);

impl FromStr for DiscountTable {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "VA-220" => Ok(Self::GroupBound),
            "VA-221" => Ok(Self::Default),
            "VA-261" => Ok(Self::GlobalProduct),
            "VA-260" => Ok(Self::ProductBound),
            other => Err(UnknownTable(other.to_owned())),
        }
    }
}

/// A discount as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRow {
    pub table: DiscountTable,
    /// Owner for customer tiers; `None` for global rows.
    pub login: Option<Login>,
    /// Product group code for group tiers, product number otherwise.
    pub code: String,
    pub group_description: String,
    pub product_description: String,
    pub percentage: Percentage,
}

impl DiscountRow {
    /// The description that belongs to this row's tier.
    #[must_use]
    pub fn description(&self) -> &str {
        if self.table.is_group() {
            &self.group_description
        } else {
            &self.product_description
        }
    }

    fn is_expired(&self) -> bool {
        self.table.is_group() && self.group_description == EXPIRED_GROUP
    }
}

/// Which ICC column the code of an entry goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeColumn {
    Group,
    Product,
}

/// One exported line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub table: DiscountTable,
    pub column: CodeColumn,
    pub code: String,
    /// Description with line breaks removed.
    pub description: String,
    pub percentage: Percentage,
}

/// The discounts that apply to one customer, in export order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountSheet {
    entries: Vec<SheetEntry>,
}

impl DiscountSheet {
    /// Resolve the exportable discounts for `login`.
    ///
    /// `rows` should contain at least every row owned by the customer and
    /// every global row; rows owned by other customers are ignored. Rows of
    /// one tier keep their input order.
    #[must_use]
    pub fn resolve<I>(login: &Login, rows: I) -> Self
    where
        I: IntoIterator<Item = DiscountRow>,
    {
        let rows: Vec<DiscountRow> = rows
            .into_iter()
            .filter(|row| !row.table.is_customer_bound() || row.login.as_ref() == Some(login))
            .collect();

        // Expired customer rows still shadow the global tier.
        let group_overrides = codes_in(&rows, DiscountTable::GroupBound);
        let product_overrides = codes_in(&rows, DiscountTable::ProductBound);

        let mut entries = Vec::with_capacity(rows.len());
        for table in DiscountTable::EXPORT_ORDER {
            let overrides = match table.overridden_by() {
                Some(DiscountTable::GroupBound) => Some(&group_overrides),
                Some(_) => Some(&product_overrides),
                None => None,
            };

            for row in rows.iter().filter(|row| row.table == table) {
                if row.is_expired() {
                    continue;
                }
                if overrides.is_some_and(|codes| codes.contains(row.code.as_str())) {
                    continue;
                }
                entries.push(SheetEntry {
                    table,
                    column: if table.is_group() {
                        CodeColumn::Group
                    } else {
                        CodeColumn::Product
                    },
                    code: row.code.clone(),
                    description: strip_line_breaks(row.description()),
                    percentage: row.percentage,
                });
            }
        }

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[SheetEntry] {
        &self.entries
    }

    /// Number of rows that will be written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discount for a single product, preferring product tiers over groups.
    #[must_use]
    pub fn product_discount(&self, product: &str, group: &str) -> Option<Percentage> {
        let by_product = self
            .entries
            .iter()
            .filter(|e| e.column == CodeColumn::Product && e.code == product)
            .max_by_key(|e| e.table == DiscountTable::ProductBound);
        let by_group = || {
            self.entries
                .iter()
                .filter(|e| e.column == CodeColumn::Group && e.code == group)
                .max_by_key(|e| e.table == DiscountTable::GroupBound)
        };
        by_product.or_else(by_group).map(|e| e.percentage)
    }
}

fn codes_in(rows: &[DiscountRow], table: DiscountTable) -> HashSet<&str> {
    rows.iter()
        .filter(|row| row.table == table)
        .map(|row| row.code.as_str())
        .collect()
}

fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;

    pub fn row(table: DiscountTable, login: Option<&str>, code: &str, pct: &str) -> DiscountRow {
        DiscountRow {
            table,
            login: login.map(|l| Login::parse(l).unwrap()),
            code: code.to_owned(),
            group_description: format!("Groep {code}"),
            product_description: format!("Product {code}"),
            percentage: pct.parse().unwrap(),
        }
    }

    fn codes(sheet: &DiscountSheet) -> Vec<(&'static str, &str)> {
        sheet
            .entries()
            .iter()
            .map(|e| (e.table.code(), e.code.as_str()))
            .collect()
    }

    fn customer() -> Login {
        Login::parse("13370").unwrap()
    }

    #[test]
    fn test_table_codes_round_trip_through_from_str() {
        for table in DiscountTable::EXPORT_ORDER {
            assert_eq!(table.code().parse::<DiscountTable>(), Ok(table));
        }
        assert!("VA-999".parse::<DiscountTable>().is_err());
    }

    #[test]
    fn test_group_tier_wins_over_default() {
        let rows = vec![
            row(DiscountTable::Default, None, "ABC", "10"),
            row(DiscountTable::Default, None, "DEF", "10"),
            row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5"),
        ];

        let sheet = DiscountSheet::resolve(&customer(), rows);

        assert_eq!(codes(&sheet), vec![("VA-220", "ABC"), ("VA-221", "DEF")]);
    }

    #[test]
    fn test_product_tier_wins_over_global_product() {
        let rows = vec![
            row(DiscountTable::ProductBound, Some("13370"), "1234567", "20"),
            row(DiscountTable::GlobalProduct, None, "1234567", "5"),
            row(DiscountTable::GlobalProduct, None, "7654321", "5"),
        ];

        let sheet = DiscountSheet::resolve(&customer(), rows);

        assert_eq!(
            codes(&sheet),
            vec![("VA-261", "7654321"), ("VA-260", "1234567")]
        );
    }

    #[test]
    fn test_other_customers_rows_are_ignored() {
        let rows = vec![
            row(DiscountTable::GroupBound, Some("99999"), "ABC", "30"),
            row(DiscountTable::Default, None, "ABC", "10"),
        ];

        let sheet = DiscountSheet::resolve(&customer(), rows);

        assert_eq!(codes(&sheet), vec![("VA-221", "ABC")]);
    }

    #[test]
    fn test_expired_groups_are_skipped_but_still_override() {
        let mut expired = row(DiscountTable::GroupBound, Some("13370"), "ABC", "30");
        expired.group_description = EXPIRED_GROUP.to_owned();
        let mut expired_default = row(DiscountTable::Default, None, "XYZ", "10");
        expired_default.group_description = EXPIRED_GROUP.to_owned();

        let rows = vec![
            expired,
            expired_default,
            row(DiscountTable::Default, None, "ABC", "10"),
        ];

        let sheet = DiscountSheet::resolve(&customer(), rows);

        assert!(sheet.is_empty());
    }

    #[test]
    fn test_expired_description_does_not_affect_product_tiers() {
        let mut product = row(DiscountTable::ProductBound, Some("13370"), "1234567", "8");
        product.group_description = EXPIRED_GROUP.to_owned();

        let sheet = DiscountSheet::resolve(&customer(), vec![product]);

        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_export_order_is_fixed() {
        let rows = vec![
            row(DiscountTable::ProductBound, Some("13370"), "1111111", "1"),
            row(DiscountTable::GlobalProduct, None, "2222222", "2"),
            row(DiscountTable::Default, None, "G3", "3"),
            row(DiscountTable::GroupBound, Some("13370"), "G4", "4"),
        ];

        let sheet = DiscountSheet::resolve(&customer(), rows);

        let tables: Vec<_> = sheet.entries().iter().map(|e| e.table).collect();
        assert_eq!(tables, DiscountTable::EXPORT_ORDER.to_vec());
    }

    #[test]
    fn test_descriptions_lose_line_breaks() {
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "1");
        r.group_description = "Kabel\r\ngoten\n".to_owned();

        let sheet = DiscountSheet::resolve(&customer(), vec![r]);

        assert_eq!(sheet.entries()[0].description, "Kabelgoten");
    }

    #[test]
    fn test_product_discount_prefers_product_tiers() {
        let rows = vec![
            row(DiscountTable::GroupBound, Some("13370"), "G1", "10"),
            row(DiscountTable::GlobalProduct, None, "1234567", "15"),
        ];
        let sheet = DiscountSheet::resolve(&customer(), rows);

        assert_eq!(
            sheet.product_discount("1234567", "G1"),
            Some("15".parse().unwrap())
        );
        assert_eq!(
            sheet.product_discount("7654321", "G1"),
            Some("10".parse().unwrap())
        );
        assert_eq!(sheet.product_discount("7654321", "G2"), None);
    }
}
