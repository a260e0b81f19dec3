//! Customer login (debtor number).
//!
//! The login doubles as the debtor number in the ICC header and as the owner
//! key on addresses, orders and user-bound discounts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a login was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("login is leeg")]
    Empty,
    #[error("login mag maximaal {max} tekens bevatten")]
    TooLong { max: usize },
    #[error("login mag alleen letters en cijfers bevatten")]
    InvalidCharacter,
}

/// A customer login such as `13370`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    pub const MAX_LENGTH: usize = 20;

    /// Parse a login, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `LoginError` when the value is empty, too long, or contains
    /// anything other than ASCII letters and digits.
    pub fn parse(s: &str) -> Result<Self, LoginError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LoginError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(LoginError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LoginError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Login {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Login {
    type Error = LoginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_debtor_number() {
        let login = Login::parse(" 13370 ").expect("valid login");
        assert_eq!(login.as_str(), "13370");
    }

    #[test]
    fn test_parse_rejects_empty_and_symbols() {
        assert_eq!(Login::parse("   "), Err(LoginError::Empty));
        assert_eq!(Login::parse("133-70"), Err(LoginError::InvalidCharacter));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        assert!(matches!(
            Login::parse(&"9".repeat(21)),
            Err(LoginError::TooLong { max: 20 })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Login>("\"13370\"").is_ok());
        assert!(serde_json::from_str::<Login>("\"\"").is_err());
    }
}
