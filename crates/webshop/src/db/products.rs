//! Product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use wtg_core::{Price, ProductNumber};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "number, name, series, product_group, price, special, clearance";

#[derive(sqlx::FromRow)]
struct ProductRow {
    number: String,
    name: String,
    series: String,
    product_group: String,
    price: Decimal,
    special: bool,
    clearance: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let number = ProductNumber::parse(&row.number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product number {}: {e}", row.number))
        })?;
        Ok(Self {
            number,
            name: row.name,
            series: row.series,
            group: row.product_group,
            price: Price::new(row.price),
            special: row.special,
            clearance: row.clearance,
        })
    }
}

fn convert(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Which flagged subset of the catalog to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Specials,
    Clearance,
}

/// Repository for the product catalog.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, number: &ProductNumber) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM webshop.product WHERE number = $1"
        ))
        .bind(number.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Several products, ordered by series and name. Unknown numbers are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many<'n, I>(&self, numbers: I) -> Result<Vec<Product>, RepositoryError>
    where
        I: IntoIterator<Item = &'n ProductNumber>,
    {
        let numbers: Vec<String> = numbers.into_iter().map(ToString::to_string).collect();
        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM webshop.product WHERE number = ANY($1) ORDER BY series, name"
        ))
        .bind(&numbers)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Products whose number, name or series contains `query`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query.trim()));

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM webshop.product
            WHERE number LIKE $1 OR name ILIKE $1 OR series ILIKE $1
            ORDER BY series, name
            LIMIT $2
            "
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Specials or clearance products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn listing(&self, listing: Listing) -> Result<Vec<Product>, RepositoryError> {
        let flag = match listing {
            Listing::Specials => "special",
            Listing::Clearance => "clearance",
        };

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM webshop.product WHERE {flag} ORDER BY series, name"
        ))
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Replace the whole catalog in one transaction.
    ///
    /// Returns the number of products inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the old
    /// catalog is then left untouched.
    #[instrument(skip(self, products), fields(products = products.len()))]
    pub async fn replace_all(&self, products: &[Product]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM webshop.product")
            .execute(&mut *tx)
            .await?;

        let mut count = 0u64;
        for product in products {
            sqlx::query(&format!(
                "INSERT INTO webshop.product ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ))
            .bind(product.number.as_str())
            .bind(&product.name)
            .bind(&product.series)
            .bind(&product.group)
            .bind(product.price.amount())
            .bind(product.special)
            .bind(product.clearance)
            .execute(&mut *tx)
            .await?;
            count += 1;
        }

        tx.commit().await?;
        Ok(count)
    }

    /// Number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webshop.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("kabel"), "kabel");
    }
}
