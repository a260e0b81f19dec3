//! Address repository.

use sqlx::PgPool;

use wtg_core::{AddressId, Login};

use super::RepositoryError;
use crate::models::{Address, NewAddress};

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_login: String,
    name: String,
    street: String,
    postcode: String,
    city: String,
    telephone: String,
    mobile: String,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.user_login)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid address owner: {e}")))?;
        Ok(Self {
            id: AddressId::new(row.id),
            login,
            name: row.name,
            street: row.street,
            postcode: row.postcode,
            city: row.city,
            telephone: row.telephone,
            mobile: row.mobile,
        })
    }
}

/// Repository for delivery addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All addresses of a customer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, login: &Login) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_login, name, street, postcode, city, telephone, mobile
            FROM webshop.address
            WHERE user_login = $1
            ORDER BY id
            ",
        )
        .bind(login.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Address::try_from).collect()
    }

    /// Store a validated address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        login: &Login,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO webshop.address (user_login, name, street, postcode, city, telephone, mobile)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_login, name, street, postcode, city, telephone, mobile
            ",
        )
        .bind(login.as_str())
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.postcode)
        .bind(&address.city)
        .bind(&address.telephone)
        .bind(&address.mobile)
        .fetch_one(self.pool)
        .await?;

        Address::try_from(row)
    }

    /// Delete an address, but only if `login` owns it.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_owned(&self, id: AddressId, login: &Login) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM webshop.address WHERE id = $1 AND user_login = $2")
            .bind(id)
            .bind(login.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
