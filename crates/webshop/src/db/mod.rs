//! Database operations for the webshop `PostgreSQL` database.
//!
//! # Schema: `webshop`
//!
//! ## Tables
//!
//! - `user` - Customer and admin accounts, favorites as a JSON array
//! - `address` - Delivery addresses per customer
//! - `order` - Placed orders with a JSON snapshot of the lines
//! - `product` - Catalog, replaced wholesale by the product import
//! - `discount` - The four discount tiers, replaced by the discount import
//! - `content` - Editable markdown blocks
//! - `tower_sessions.session` - Session storage (created by the store migration)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/webshop/migrations/` and run via:
//! ```bash
//! cargo run -p wtg-cli -- migrate
//! ```

pub mod addresses;
pub mod content;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use content::ContentRepository;
pub use discounts::DiscountRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate login).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique violations to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
