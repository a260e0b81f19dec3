//! E-mail address of a webshop customer.
//!
//! Discount files and order confirmations are mailed to this address, so the
//! value is checked once on the way in (user manager, CLI) and trusted
//! afterwards.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an e-mail address was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("e-mailadres is leeg")]
    Empty,
    #[error("e-mailadres is langer dan {max} tekens")]
    TooLong { max: usize },
    #[error("e-mailadres mist een @")]
    MissingAtSymbol,
    #[error("e-mailadres heeft geen naam voor de @")]
    EmptyLocalPart,
    #[error("e-mailadres heeft geen domein na de @")]
    EmptyDomain,
}

/// A syntactically plausible e-mail address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse and trim an address.
    ///
    /// # Errors
    ///
    /// Returns an `EmailError` describing the first problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        assert!(Email::parse("verkoop@wiringa.nl").is_ok());
        assert!(Email::parse("inkoop+wtg@installateur.example.com").is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let email = Email::parse("  info@example.nl ").expect("valid");
        assert_eq!(email.as_str(), "info@example.nl");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("geen-apenstaart"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@example.nl"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("info@"), Err(EmailError::EmptyDomain));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@example.nl", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }
}
