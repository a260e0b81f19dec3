//! Parsing of the ERP catalog and discount exports uploaded by admins.
//!
//! Both files are `;`-separated, one record per line. The first line is
//! skipped when it looks like a column header. Files from the ERP are often
//! Windows-1252 encoded, so uploads that are not valid UTF-8 are decoded as such.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use wtg_core::{DiscountRow, DiscountTable, Login, Percentage, Price, ProductNumber};

use crate::models::Product;

const DELIMITER: char = ';';
const PRODUCT_FIELDS: usize = 7;
const DISCOUNT_FIELDS: usize = 6;

/// A malformed import line.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Regel {line}: {reason}")]
pub struct ImportError {
    /// 1-based line number in the uploaded file.
    pub line: usize,
    pub reason: String,
}

impl ImportError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Decode an upload, falling back to Windows-1252.
#[must_use]
pub fn decode(bytes: &[u8]) -> String {
    let without_bom = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(without_bom) {
        Some(text) => text.into_owned(),
        None => encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

/// Parse a product export: `number;name;series;group;price;special;clearance`.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_products(input: &str) -> Result<Vec<Product>, ImportError> {
    records(input, PRODUCT_FIELDS)?
        .into_iter()
        .map(|(line, fields)| product(line, &fields))
        .collect()
}

/// Parse a discount export: `table;login;product;group_desc;product_desc;discount`.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_discounts(input: &str) -> Result<Vec<DiscountRow>, ImportError> {
    records(input, DISCOUNT_FIELDS)?
        .into_iter()
        .map(|(line, fields)| discount(line, &fields))
        .collect()
}

/// Non-empty records with their line numbers, header dropped.
fn records(input: &str, width: usize) -> Result<Vec<(usize, Vec<&str>)>, ImportError> {
    let mut out = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        if index == 0 && is_header(raw) {
            continue;
        }

        let fields: Vec<&str> = raw.split(DELIMITER).map(str::trim).collect();
        if fields.len() < width {
            return Err(ImportError::new(
                line,
                format!("{width} velden verwacht, {} gevonden", fields.len()),
            ));
        }
        out.push((line, fields));
    }

    Ok(out)
}

fn is_header(line: &str) -> bool {
    let first = line.split(DELIMITER).next().unwrap_or_default().trim();
    !(first.starts_with(|c: char| c.is_ascii_digit()) || first.starts_with("VA"))
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or_default()
}

fn product(line: usize, fields: &[&str]) -> Result<Product, ImportError> {
    let number = ProductNumber::parse(field(fields, 0))
        .map_err(|e| ImportError::new(line, format!("artikelnummer: {e}")))?;
    let price = decimal(field(fields, 4))
        .ok_or_else(|| ImportError::new(line, format!("ongeldige prijs '{}'", field(fields, 4))))?;

    Ok(Product {
        number,
        name: field(fields, 1).to_owned(),
        series: field(fields, 2).to_owned(),
        group: field(fields, 3).to_owned(),
        price: Price::new(price),
        special: flag(field(fields, 5)),
        clearance: flag(field(fields, 6)),
    })
}

fn discount(line: usize, fields: &[&str]) -> Result<DiscountRow, ImportError> {
    let table = DiscountTable::from_str(field(fields, 0))
        .map_err(|e| ImportError::new(line, e.to_string()))?;

    let login = match field(fields, 1) {
        _ if !table.is_customer_bound() => None,
        "" => {
            return Err(ImportError::new(
                line,
                format!("{} vereist een debiteurnummer", table.code()),
            ));
        }
        raw => Some(
            Login::parse(raw).map_err(|e| ImportError::new(line, format!("debiteur: {e}")))?,
        ),
    };

    let code = field(fields, 2);
    if code.is_empty() {
        return Err(ImportError::new(line, "geen product- of groepscode"));
    }

    let percentage = decimal(field(fields, 5))
        .and_then(|d| Percentage::new(d).ok())
        .ok_or_else(|| {
            ImportError::new(line, format!("ongeldige korting '{}'", field(fields, 5)))
        })?;

    Ok(DiscountRow {
        table,
        login,
        code: code.to_owned(),
        group_description: field(fields, 3).to_owned(),
        product_description: field(fields, 4).to_owned(),
        percentage,
    })
}

/// Parse a decimal written with either `,` or `.`.
fn decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(&s.replace(',', ".")).ok()
}

fn flag(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "1" | "j" | "ja" | "y" | "yes" | "true"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_products_with_header() {
        let input = "Artikelnr;Naam;Serie;Groep;Prijs;Actie;Opruiming\r\n\
                     1234567;Knelkoppeling 15mm;Knel;KN01;2,35;1;0\r\n\
                     7654321;Kogelkraan 1/2\";Kranen;KR10;12.50;;j\r\n";

        let products = parse_products(input).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].number.as_str(), "1234567");
        assert_eq!(products[0].price.amount(), Decimal::new(235, 2));
        assert!(products[0].special);
        assert!(!products[0].clearance);
        assert_eq!(products[1].price.amount(), Decimal::new(1250, 2));
        assert!(!products[1].special);
        assert!(products[1].clearance);
    }

    #[test]
    fn test_products_without_header() {
        let products = parse_products("1234567;Bocht;Knel;KN01;1;0;0").unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn test_bad_product_number_reports_line() {
        let input = "1234567;Bocht;Knel;KN01;1;0;0\n\n123;Kapot;Knel;KN01;1;0;0\n";
        let err = parse_products(input).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let err = parse_products("1234567;Bocht;Knel").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("7 velden"));
    }

    #[test]
    fn test_discounts() {
        let input = "tabel;debiteur;code;groep;product;korting\n\
                     VA-220;13370;ABC;Afvoer;;12,5\n\
                     VA-221;;ABC;Afvoer;;10\n\
                     VA-261;13370;1234567;;Bocht;7.25\n";

        let rows = parse_discounts(input).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].table, DiscountTable::GroupBound);
        assert_eq!(rows[0].login.as_ref().unwrap().as_str(), "13370");
        assert_eq!(rows[0].percentage.to_dutch(), "12,5");
        assert!(rows[1].login.is_none());
        // global tiers never carry an owner
        assert!(rows[2].login.is_none());
        assert_eq!(rows[2].product_description, "Bocht");
    }

    #[test]
    fn test_customer_tier_requires_login() {
        let err = parse_discounts("VA-260;;1234567;;Bocht;5").unwrap_err();
        assert!(err.reason.contains("VA-260"));
    }

    #[test]
    fn test_unknown_table_and_bad_percentage() {
        assert!(parse_discounts("VA-999;1;ABC;;;5").is_err());
        assert!(parse_discounts("VA-221;;ABC;;;150").is_err());
        assert!(parse_discounts("VA-221;;ABC;;;veel").is_err());
    }

    #[test]
    fn test_decode_windows_1252() {
        let bytes = b"1234567;Caf\xe9 \x80;;;1;0;0";
        assert_eq!(decode(bytes), "1234567;Café €;;;1;0;0");
        assert_eq!(decode("\u{feff}abc".as_bytes()), "abc");
        assert_eq!(decode("Ø16".as_bytes()), "Ø16");
    }
}
