//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a customer account
//! wtg-cli user create -l 13370 -c "Installatiebedrijf De Vries" -e inkoop@devries.nl -p geheim123
//!
//! # Create an administrator
//! wtg-cli user create -l 10000 -c "Wiringa" -p geheim123 --admin
//!
//! # Reset a password
//! wtg-cli user password -l 13370 -p nieuwwachtwoord
//! ```

use wtg_core::{Email, Login};
use wtg_webshop::db::UserRepository;
use wtg_webshop::db::users::NewUser;
use wtg_webshop::services::auth::{hash_password, validate_password};

use super::{CommandError, connect};

/// Create a new account.
///
/// Returns the database id of the created user.
pub async fn create(
    login: &str,
    company: &str,
    email: Option<&str>,
    password: &str,
    is_admin: bool,
) -> Result<i32, CommandError> {
    let login = Login::parse(login)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid login {login}: {e}")))?;
    let email = email
        .map(Email::parse)
        .transpose()
        .map_err(|e| CommandError::InvalidArgument(format!("invalid email: {e}")))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", login, company);
    let user = UserRepository::new(&pool)
        .create(&NewUser {
            login: &login,
            company,
            email: email.as_ref(),
            password_hash: &password_hash,
            is_admin,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Login: {}, Admin: {}",
        user.id,
        user.login,
        user.is_admin
    );

    Ok(user.id.as_i32())
}

/// Replace the password of an existing account.
pub async fn set_password(login: &str, password: &str) -> Result<(), CommandError> {
    let login = Login::parse(login)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid login {login}: {e}")))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_login(&login)
        .await?
        .ok_or_else(|| CommandError::InvalidArgument(format!("no user with login {login}")))?;

    users.update_password(user.id, &password_hash).await?;
    tracing::info!("Password updated for {}", login);
    Ok(())
}
