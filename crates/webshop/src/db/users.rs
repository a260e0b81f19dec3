//! User repository.
//!
//! Queries are checked at runtime (`query_as`) and rows are converted into
//! validated domain types, reporting bad data as `DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use wtg_core::{Email, Favorites, Login, ProductNumber, Toggle, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

const USER_COLUMNS: &str =
    "id, login, company, email, is_admin, favorites, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    login: String,
    company: String,
    email: Option<String>,
    is_admin: bool,
    favorites: Json<Favorites>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.login).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login in database: {e}"))
        })?;
        let email = row
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            login,
            company: row.company,
            email,
            is_admin: row.is_admin,
            favorites: row.favorites.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A user to be created.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub login: &'a Login,
    pub company: &'a str,
    pub email: Option<&'a Email>,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

/// Changes to an existing user. `None` leaves the password as is.
#[derive(Debug)]
pub struct UserChanges<'a> {
    pub company: &'a str,
    pub email: Option<&'a Email>,
    pub password_hash: Option<&'a str>,
    pub is_admin: bool,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM webshop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by login. The match is exact, so `1337` does not find `13370`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_login(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM webshop.user WHERE login = $1"
        ))
        .bind(login.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_password_hash(
        &self,
        login: &Login,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserWithHashRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM webshop.user WHERE login = $1"
        ))
        .bind(login.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the login already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, user), fields(login = %user.login))]
    pub async fn create(&self, user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO webshop.user (login, company, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.login.as_str())
        .bind(user.company)
        .bind(user.email.map(Email::as_str))
        .bind(user.password_hash)
        .bind(user.is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "login"))?;

        User::try_from(row)
    }

    /// Update company, e-mail, admin flag and optionally the password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this login.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, changes), fields(login = %login))]
    pub async fn update(
        &self,
        login: &Login,
        changes: &UserChanges<'_>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE webshop.user
            SET company = $2,
                email = $3,
                is_admin = $4,
                password_hash = COALESCE($5, password_hash)
            WHERE login = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(login.as_str())
        .bind(changes.company)
        .bind(changes.email.map(Email::as_str))
        .bind(changes.is_admin)
        .bind(changes.password_hash)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE webshop.user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add or remove one favorite. The row stays locked between reading and
    /// writing the list, so concurrent toggles are applied one after another.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn toggle_favorite(
        &self,
        id: UserId,
        product: ProductNumber,
    ) -> Result<Toggle, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Json<Favorites>,)> =
            sqlx::query_as("SELECT favorites FROM webshop.user WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((Json(mut favorites),)) = row else {
            return Err(RepositoryError::NotFound);
        };

        let toggle = favorites.toggle(product);

        sqlx::query("UPDATE webshop.user SET favorites = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(&favorites))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(toggle)
    }

    /// Number of accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webshop.user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
