//! ICC and CSV discount files.
//!
//! # ICC
//!
//! A fixed-width text format read by installer software. One header row,
//! then one 130 byte row per discount, every row ending in `\r\n`. Readers
//! cut columns by byte offset, so the file is written in Windows-1252 where
//! every character is a single byte:
//!
//! ```text
//! group(20) product(20) description(50) discount1(5) discount2(5)
//! discount3(5) net-price(9) start(8) end(8)
//! ```
//!
//! # CSV
//!
//! `;`-separated with a Dutch header row, for spreadsheet users. Written
//! in UTF-8 with the fields as they are.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::discount::{CodeColumn, DiscountSheet, SheetEntry};
use crate::types::Login;

/// GLN of Wiringa Technische Groothandel, used when none is configured.
pub const DEFAULT_GLN: &str = "8714253038995";

const ICC_CODE_WIDTH: usize = 20;
const ICC_DESCRIPTION_WIDTH: usize = 50;
const ICC_GLN_WIDTH: usize = 13;
const ICC_COMPANY_WIDTH: usize = 71;
const ICC_HEADER_GAP_1: usize = 7;
const ICC_HEADER_GAP_2: usize = 15;
const ICC_VERSION: &str = "1.1  ";
const ICC_UNUSED_DISCOUNT: &str = "00000";
const ICC_NET_PRICE: &str = "000000000";
const ICC_END_DATE: &str = "99991231";
const ICC_COUNT_WIDTH: usize = 6;

const CSV_HEADER: &str = "Artikelnr;Omschrijving;Kortingspercentage;ingangsdatum";
const CSV_DELIMITER: &str = ";";

const LINE_END: &str = "\r\n";

/// Errors selecting an export.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Ongeldig bestands type")]
    UnknownType(String),
    #[error("Geen verzendmethode opgegeven")]
    UnknownDelivery(String),
}

/// The two export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Icc,
    Csv,
}

impl FileType {
    /// Attachment name, e.g. `icc_data13370.txt`.
    #[must_use]
    pub fn file_name(self, login: &Login) -> String {
        let extension = match self {
            Self::Icc => "txt",
            Self::Csv => "csv",
        };
        format!("icc_data{login}.{extension}")
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Icc => "text/plain; charset=windows-1252",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Icc => "ICC",
            Self::Csv => "CSV",
        }
    }

    /// The bytes of a rendered file as they are sent.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Icc => encoding_rs::WINDOWS_1252.encode(text).0.into_owned(),
            Self::Csv => text.as_bytes().to_vec(),
        }
    }

    /// Render the sheet in this format.
    #[must_use]
    pub fn render(self, sheet: &DiscountSheet, header: &IccHeader<'_>, today: NaiveDate) -> String {
        match self {
            Self::Icc => icc(sheet, header, today),
            Self::Csv => csv(sheet, today),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "icc" => Ok(Self::Icc),
            "csv" => Ok(Self::Csv),
            other => Err(ExportError::UnknownType(other.to_owned())),
        }
    }
}

/// How the customer receives the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Download,
    Mail,
}

impl FromStr for Delivery {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download" => Ok(Self::Download),
            "mail" => Ok(Self::Mail),
            other => Err(ExportError::UnknownDelivery(other.to_owned())),
        }
    }
}

/// Data for the ICC header row.
#[derive(Debug, Clone, Copy)]
pub struct IccHeader<'a> {
    pub gln: &'a str,
    pub login: &'a Login,
    pub company: &'a str,
}

/// Render an ICC file.
#[must_use]
pub fn icc(sheet: &DiscountSheet, header: &IccHeader<'_>, today: NaiveDate) -> String {
    let date = today.format("%Y%m%d").to_string();

    let mut out = String::with_capacity((sheet.len() + 1) * 140);
    out.push_str(&fixed(header.gln, ICC_GLN_WIDTH));
    out.push_str(&" ".repeat(ICC_HEADER_GAP_1));
    out.push_str(header.login.as_str());
    out.push_str(&" ".repeat(ICC_HEADER_GAP_2));
    out.push_str(&date);
    out.push_str(&format!("{:0width$}", sheet.len(), width = ICC_COUNT_WIDTH));
    out.push_str(ICC_VERSION);
    out.push_str(&pad_right(header.company, ICC_COMPANY_WIDTH));
    out.push_str(LINE_END);

    for entry in sheet.entries() {
        out.push_str(&icc_row(entry, &date));
    }
    out
}

fn icc_row(entry: &SheetEntry, date: &str) -> String {
    let code = fixed(&entry.code, ICC_CODE_WIDTH);
    let blank = " ".repeat(ICC_CODE_WIDTH);
    let (group, product) = match entry.column {
        CodeColumn::Group => (code, blank),
        CodeColumn::Product => (blank, code),
    };

    let description = fixed(&entry.description, ICC_DESCRIPTION_WIDTH);
    let discount = entry.percentage.to_icc();

    [
        group.as_str(),
        product.as_str(),
        description.as_str(),
        discount.as_str(),
        ICC_UNUSED_DISCOUNT,
        ICC_UNUSED_DISCOUNT,
        ICC_NET_PRICE,
        date,
        ICC_END_DATE,
        LINE_END,
    ]
    .concat()
}

/// Render a CSV file.
#[must_use]
pub fn csv(sheet: &DiscountSheet, today: NaiveDate) -> String {
    let date = today.format("%Y-%m-%d").to_string();

    let mut out = String::from(CSV_HEADER);
    out.push_str(LINE_END);
    for entry in sheet.entries() {
        let percentage = entry.percentage.to_string();
        let fields = [
            entry.code.as_str(),
            entry.description.as_str(),
            percentage.as_str(),
            date.as_str(),
        ];
        out.push_str(&fields.join(CSV_DELIMITER));
        out.push_str(LINE_END);
    }
    out
}

/// Characters of an ICC field. Anything Windows-1252 cannot hold becomes
/// `?` and control characters become spaces, so one char is one output byte.
fn icc_chars(value: &str) -> impl Iterator<Item = char> + '_ {
    value.chars().map(|c| {
        if c.is_control() {
            ' '
        } else if fits_windows_1252(c) {
            c
        } else {
            '?'
        }
    })
}

fn fits_windows_1252(c: char) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
    !had_errors
}

/// Pad with spaces or cut so the result is exactly `width` bytes once encoded.
fn fixed(value: &str, width: usize) -> String {
    let mut out: String = icc_chars(value).take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

/// Pad with spaces to at least `width` bytes once encoded, never cutting.
fn pad_right(value: &str, width: usize) -> String {
    let value: String = icc_chars(value).collect();
    format!("{value:<width$}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::discount::DiscountTable;
    use crate::discount::tests::row;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn customer() -> Login {
        Login::parse("13370").unwrap()
    }

    fn header(login: &Login) -> IccHeader<'_> {
        IccHeader {
            gln: DEFAULT_GLN,
            login,
            company: "Installatiebedrijf Jansen",
        }
    }

    fn lines(text: &str) -> Vec<&str> {
        let trimmed = text.strip_suffix("\r\n").unwrap();
        trimmed.split("\r\n").collect()
    }

    #[test]
    fn test_csv_single_group_discount() {
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5");
        r.group_description = "Schakelmateriaal".to_owned();
        let sheet = DiscountSheet::resolve(&customer(), vec![r]);

        assert_eq!(
            csv(&sheet, today()),
            "Artikelnr;Omschrijving;Kortingspercentage;ingangsdatum\r\n\
             ABC;Schakelmateriaal;12,5%;2026-10-16\r\n"
        );
    }

    #[test]
    fn test_csv_empty_sheet_is_header_only() {
        assert_eq!(
            csv(&DiscountSheet::default(), today()),
            "Artikelnr;Omschrijving;Kortingspercentage;ingangsdatum\r\n"
        );
    }

    #[test]
    fn test_csv_fields_are_written_unchanged() {
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "1");
        r.group_description = "Buis;PVC Ø16 flexibel".to_owned();
        let sheet = DiscountSheet::resolve(&customer(), vec![r]);
        let text = csv(&sheet, today());

        assert!(text.contains("ABC;Buis;PVC Ø16 flexibel;1%;"));
        assert_eq!(FileType::Csv.encode(&text), text.as_bytes());
    }

    #[test]
    fn test_icc_header_layout() {
        let login = customer();
        let rows = vec![
            row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5"),
            row(DiscountTable::GlobalProduct, None, "1234567", "5"),
        ];
        let sheet = DiscountSheet::resolve(&login, rows);

        let text = icc(&sheet, &header(&login), today());
        let head = lines(&text)[0];

        let expected_prefix = format!(
            "8714253038995{}13370{}20261016000002{}",
            " ".repeat(7),
            " ".repeat(15),
            "1.1  "
        );
        assert!(head.starts_with(&expected_prefix), "{head:?}");
        let company = &head[expected_prefix.len()..];
        assert_eq!(company.len(), 71);
        assert_eq!(company.trim_end(), "Installatiebedrijf Jansen");
    }

    #[test]
    fn test_icc_row_count_matches_emitted_rows() {
        let login = customer();
        let rows = vec![
            row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5"),
            row(DiscountTable::Default, None, "ABC", "10"),
            row(DiscountTable::Default, None, "DEF", "10"),
            row(DiscountTable::GlobalProduct, None, "1234567", "5"),
            row(DiscountTable::ProductBound, Some("13370"), "7654321", "7"),
        ];
        let sheet = DiscountSheet::resolve(&login, rows);

        let text = icc(&sheet, &header(&login), today());
        let all = lines(&text);
        let count: usize = all[0][48..54].parse().unwrap();

        assert_eq!(count, all.len() - 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_icc_group_row_fields() {
        let login = customer();
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5");
        r.group_description = "Schakelmateriaal".to_owned();
        let sheet = DiscountSheet::resolve(&login, vec![r]);

        let text = icc(&sheet, &header(&login), today());
        let line = lines(&text)[1];

        assert_eq!(line.len(), 130);
        assert_eq!(&line[0..20], format!("{:<20}", "ABC"));
        assert_eq!(&line[20..40], " ".repeat(20));
        assert_eq!(&line[40..90], format!("{:<50}", "Schakelmateriaal"));
        assert_eq!(&line[90..95], "01250");
        assert_eq!(&line[95..105], "0000000000");
        assert_eq!(&line[105..114], "000000000");
        assert_eq!(&line[114..122], "20261016");
        assert_eq!(&line[122..130], "99991231");
    }

    #[test]
    fn test_icc_product_row_uses_product_column() {
        let login = customer();
        let sheet = DiscountSheet::resolve(
            &login,
            vec![row(DiscountTable::ProductBound, Some("13370"), "1234567", "5")],
        );

        let text = icc(&sheet, &header(&login), today());
        let line = lines(&text)[1];

        assert_eq!(&line[0..20], " ".repeat(20));
        assert_eq!(&line[20..40], format!("{:<20}", "1234567"));
        assert_eq!(&line[40..90], format!("{:<50}", "Product 1234567"));
        assert_eq!(&line[90..95], "00500");
    }

    fn encoded_lines(bytes: &[u8]) -> Vec<&[u8]> {
        let trimmed = bytes.strip_suffix(b"\r\n").unwrap();
        trimmed.split(|b| *b == b'\n').map(|l| l.strip_suffix(b"\r").unwrap_or(l)).collect()
    }

    #[test]
    fn test_icc_long_fields_are_cut_to_width() {
        let login = customer();
        let mut r = row(DiscountTable::GroupBound, Some("13370"), &"G".repeat(25), "1");
        r.group_description = "é".repeat(60);
        let sheet = DiscountSheet::resolve(&login, vec![r]);

        let bytes = FileType::Icc.encode(&icc(&sheet, &header(&login), today()));
        let line = encoded_lines(&bytes)[1];

        assert_eq!(line.len(), 130);
        assert_eq!(line.iter().filter(|b| **b == 0xE9).count(), 50);
        assert_eq!(line.iter().filter(|b| **b == b'G').count(), 20);
    }

    #[test]
    fn test_icc_accented_description_keeps_byte_columns() {
        let login = customer();
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "12,5");
        r.group_description = "Caféïne koffiezetapparaten".to_owned();
        let sheet = DiscountSheet::resolve(&login, vec![r]);

        let bytes = FileType::Icc.encode(&icc(&sheet, &header(&login), today()));
        let line = encoded_lines(&bytes)[1];

        assert_eq!(line.len(), 130);
        assert_eq!(&line[40..47], b"Caf\xE9\xEFne");
        assert_eq!(&line[90..95], b"01250");
        assert_eq!(&line[114..122], b"20261016");
    }

    #[test]
    fn test_icc_unencodable_characters_are_replaced() {
        let login = customer();
        let mut r = row(DiscountTable::GroupBound, Some("13370"), "ABC", "1");
        r.group_description = "Kabel → 中\tgrijs".to_owned();
        let sheet = DiscountSheet::resolve(&login, vec![r]);
        let header = IccHeader {
            gln: DEFAULT_GLN,
            login: &login,
            company: "Bouwbedrijf Ørsted 東",
        };

        let bytes = FileType::Icc.encode(&icc(&sheet, &header, today()));
        let all = encoded_lines(&bytes);

        assert_eq!(all[0].len(), 130);
        assert_eq!(all[1].len(), 130);
        assert_eq!(&all[1][40..56], b"Kabel ? ? grijs ");
    }

    #[test]
    fn test_fixed_width_helper() {
        assert_eq!(fixed("abc", 5), "abc  ");
        assert_eq!(fixed("abcdefg", 5), "abcde");
        assert_eq!(fixed("", 3), "   ");
        assert_eq!(fixed("ab\u{2603}", 4), "ab? ");
        assert_eq!(pad_right(&"x".repeat(80), 71).len(), 80);
    }

    #[test]
    fn test_file_type_and_delivery_parsing() {
        assert_eq!("icc".parse::<FileType>(), Ok(FileType::Icc));
        assert_eq!("csv".parse::<FileType>(), Ok(FileType::Csv));
        assert_eq!(
            "pdf".parse::<FileType>().unwrap_err().to_string(),
            "Ongeldig bestands type"
        );
        assert_eq!("mail".parse::<Delivery>(), Ok(Delivery::Mail));
        assert_eq!(
            "fax".parse::<Delivery>().unwrap_err().to_string(),
            "Geen verzendmethode opgegeven"
        );
    }

    #[test]
    fn test_file_names() {
        let login = customer();
        assert_eq!(FileType::Icc.file_name(&login), "icc_data13370.txt");
        assert_eq!(FileType::Csv.file_name(&login), "icc_data13370.csv");
    }
}
