//! Authentication service.
//!
//! Password login and password changes for debtor accounts. Hashes are
//! Argon2id in PHC string format.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use wtg_core::{Login, UserId};

use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Outcome of a password change attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChange {
    Changed,
    MissingFields,
    WrongOldPassword,
    Mismatch,
}

impl PasswordChange {
    /// The flash message shown for this outcome.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Changed => "Uw wachtwoord is gewijzigd",
            Self::MissingFields => "Niet alle velden zijn ingevuld",
            Self::WrongOldPassword => "Het oude wachtwoord is onjuist!",
            Self::Mismatch => "De nieuwe wachtwoorden komen niet overeen",
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Login with debtor number and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the login/password is wrong.
    pub async fn login(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = Login::parse(login)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a password after checking the old one.
    ///
    /// Validation problems are reported through [`PasswordChange`] so the
    /// caller can flash them; only infrastructure failures are errors.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account disappeared.
    /// Returns `AuthError::Repository` or `AuthError::PasswordHash` on failure.
    pub async fn change_password(
        &self,
        login: &Login,
        old: &str,
        new: &str,
        verify: &str,
    ) -> Result<PasswordChange, AuthError> {
        if old.is_empty() || new.is_empty() || verify.is_empty() {
            return Ok(PasswordChange::MissingFields);
        }

        let (user, password_hash) = self
            .users
            .get_password_hash(login)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match verify_password(old, &password_hash) {
            Ok(()) => {}
            Err(AuthError::InvalidCredentials) => {
                tracing::warn!(
                    "User: {login} tried to change password but entered the wrong password."
                );
                return Ok(PasswordChange::WrongOldPassword);
            }
            Err(e) => return Err(e),
        }

        if new != verify {
            return Ok(PasswordChange::Mismatch);
        }

        self.set_password(user.id, new).await?;
        tracing::info!(login = %login, "Password changed");

        Ok(PasswordChange::Changed)
    }

    /// Store a new password without checking the old one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    pub async fn set_password(&self, id: UserId, password: &str) -> Result<(), AuthError> {
        validate_password(password)?;
        let hash = hash_password(password)?;
        self.users
            .update_password(id, &hash)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("kraan-1956").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("kraan-1956", &hash).is_ok());
        assert!(matches!(
            verify_password("kraan-1957", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_password_change_messages() {
        assert_eq!(PasswordChange::Changed.message(), "Uw wachtwoord is gewijzigd");
        assert_eq!(
            PasswordChange::Mismatch.message(),
            "De nieuwe wachtwoorden komen niet overeen"
        );
    }
}
