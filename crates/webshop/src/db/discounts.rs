//! Discount repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use wtg_core::{DiscountRow, DiscountTable, Login, Percentage};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct DiscountDbRow {
    table_code: String,
    user_login: Option<String>,
    code: String,
    group_description: String,
    product_description: String,
    percentage: Decimal,
}

impl TryFrom<DiscountDbRow> for DiscountRow {
    type Error = RepositoryError;

    fn try_from(row: DiscountDbRow) -> Result<Self, Self::Error> {
        let table: DiscountTable = row
            .table_code
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
        let login = row
            .user_login
            .as_deref()
            .map(Login::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid discount owner: {e}")))?;
        let percentage = Percentage::new(row.percentage)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid discount: {e}")))?;

        Ok(Self {
            table,
            login,
            code: row.code,
            group_description: row.group_description,
            product_description: row.product_description,
            percentage,
        })
    }
}

/// Repository for the discount tiers.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every global row plus every row owned by `login`, in import order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    #[instrument(skip(self), fields(login = %login))]
    pub async fn rows_for(&self, login: &Login) -> Result<Vec<DiscountRow>, RepositoryError> {
        let rows: Vec<DiscountDbRow> = sqlx::query_as(
            r"
            SELECT table_code, user_login, code, group_description, product_description, percentage
            FROM webshop.discount
            WHERE table_code IN ('VA-221', 'VA-261') OR user_login = $1
            ORDER BY id
            ",
        )
        .bind(login.as_str())
        .fetch_all(self.pool)
        .await?;

        tracing::debug!(rows = rows.len(), "Loaded discount rows");
        rows.into_iter().map(DiscountRow::try_from).collect()
    }

    /// Replace the whole discount table in one transaction.
    ///
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the old
    /// table is then left untouched.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn replace_all(&self, rows: &[DiscountRow]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM webshop.discount")
            .execute(&mut *tx)
            .await?;

        let mut count = 0u64;
        for row in rows {
            sqlx::query(
                r"
                INSERT INTO webshop.discount
                    (table_code, user_login, code, group_description, product_description, percentage)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(row.table.code())
            .bind(row.login.as_ref().map(Login::as_str))
            .bind(&row.code)
            .bind(&row.group_description)
            .bind(&row.product_description)
            .bind(row.percentage.as_decimal())
            .execute(&mut *tx)
            .await?;
            count += 1;
        }

        tx.commit().await?;
        Ok(count)
    }

    /// Number of discount rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webshop.discount")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
