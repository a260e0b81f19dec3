//! Delivery addresses.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use wtg_core::{AddressId, Login};

/// Shown when a required field is missing.
pub const MISSING_FIELDS: &str = "Een of meer vereiste velden zijn leeg";

const POSTCODE_MIN: usize = 6;
const POSTCODE_MAX: usize = 8;

static STREET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s]+$").expect("Invalid regex"));
static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("Invalid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s\-]+$").expect("Invalid regex"));

/// A stored address.
#[derive(Debug, Clone)]
pub struct Address {
    pub id: AddressId,
    pub login: Login,
    pub name: String,
    pub street: String,
    pub postcode: String,
    pub city: String,
    pub telephone: String,
    pub mobile: String,
}

/// The add-address form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub mobile: String,
}

/// A validated address ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub name: String,
    pub street: String,
    pub postcode: String,
    pub city: String,
    pub telephone: String,
    pub mobile: String,
}

impl AddressForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns every problem found, one message per line, or just
    /// [`MISSING_FIELDS`] when a required field is empty.
    pub fn validate(self) -> Result<NewAddress, Vec<String>> {
        let name = self.name.trim().to_owned();
        let street = self.street.trim().to_owned();
        let postcode = self.postcode.trim().to_owned();
        let city = self.city.trim().to_owned();
        let telephone = self.telephone.trim().to_owned();
        let mobile = self.mobile.trim().to_owned();

        if [&name, &street, &postcode, &city].iter().any(|f| f.is_empty()) {
            return Err(vec![MISSING_FIELDS.to_owned()]);
        }

        let mut errors = Vec::new();
        if !STREET_RE.is_match(&street) {
            errors.push("Straat mag alleen letters, cijfers en spaties bevatten".to_owned());
        }
        if !STREET_RE.is_match(&postcode) {
            errors.push("Postcode mag alleen letters, cijfers en spaties bevatten".to_owned());
        }
        let postcode_len = postcode.chars().count();
        if !(POSTCODE_MIN..=POSTCODE_MAX).contains(&postcode_len) {
            errors.push(format!(
                "Postcode moet tussen {POSTCODE_MIN} en {POSTCODE_MAX} tekens lang zijn"
            ));
        }
        if !CITY_RE.is_match(&city) {
            errors.push("Plaats mag alleen letters en spaties bevatten".to_owned());
        }
        if !telephone.is_empty() && !PHONE_RE.is_match(&telephone) {
            errors.push("Telefoon mag alleen cijfers, spaties en streepjes bevatten".to_owned());
        }
        if !mobile.is_empty() && !PHONE_RE.is_match(&mobile) {
            errors.push("Mobiel mag alleen cijfers, spaties en streepjes bevatten".to_owned());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewAddress {
            name,
            street,
            postcode,
            city,
            telephone,
            mobile,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            name: "Installatiebedrijf Jansen".to_owned(),
            street: "Hoofdstraat 12".to_owned(),
            postcode: "9711 AB".to_owned(),
            city: "Groningen".to_owned(),
            telephone: "050-1234567".to_owned(),
            mobile: String::new(),
        }
    }

    #[test]
    fn test_valid_address() {
        let address = form().validate().unwrap();
        assert_eq!(address.postcode, "9711 AB");
        assert_eq!(address.mobile, "");
    }

    #[test]
    fn test_missing_required_field() {
        let mut f = form();
        f.city = "  ".to_owned();
        assert_eq!(f.validate(), Err(vec![MISSING_FIELDS.to_owned()]));
    }

    #[test]
    fn test_street_rejects_punctuation() {
        let mut f = form();
        f.street = "Hoofdstraat 12-a".to_owned();
        assert_eq!(f.validate().unwrap_err().len(), 1);
    }

    #[test]
    fn test_postcode_length_bounds() {
        for (postcode, ok) in [("9711A", false), ("9711AB", true), ("9711 ABC", true), ("9711 ABCD", false)] {
            let mut f = form();
            f.postcode = postcode.to_owned();
            assert_eq!(f.validate().is_ok(), ok, "{postcode}");
        }
    }

    #[test]
    fn test_city_rejects_digits() {
        let mut f = form();
        f.city = "Groningen 2".to_owned();
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_phone_numbers_are_optional_but_checked() {
        let mut f = form();
        f.telephone = String::new();
        f.mobile = "06 12345678".to_owned();
        assert!(f.clone().validate().is_ok());

        f.mobile = "+31 6 12345678".to_owned();
        let errors = f.validate().unwrap_err();
        assert_eq!(errors, vec!["Mobiel mag alleen cijfers, spaties en streepjes bevatten"]);
    }

    #[test]
    fn test_collects_all_errors() {
        let f = AddressForm {
            name: "X".to_owned(),
            street: "straat!".to_owned(),
            postcode: "12".to_owned(),
            city: "123".to_owned(),
            telephone: "abc".to_owned(),
            mobile: String::new(),
        };
        assert_eq!(f.validate().unwrap_err().len(), 4);
    }
}
