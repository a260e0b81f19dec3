//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use sqlx::types::Json;
use tracing::instrument;

use wtg_core::{Login, OrderId};

use super::RepositoryError;
use crate::models::{Order, OrderLine};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_login: String,
    products: Json<Vec<OrderLine>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.user_login)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order owner: {e}")))?;
        Ok(Self {
            id: OrderId::new(row.id),
            login,
            lines: row.products.0,
            created_at: row.created_at,
        })
    }
}

/// One page of a customer's order history.
#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// 1-based page number.
    pub page: u32,
    pub last_page: u32,
}

/// Repository for placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Number of orders placed by a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for(&self, login: &Login) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM webshop.order WHERE user_login = $1")
                .bind(login.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Number of orders overall.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webshop.order")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// A page of a customer's orders, newest first. Pages past the end are
    /// clamped to the last page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn page_for(
        &self,
        login: &Login,
        page: u32,
        per_page: u32,
    ) -> Result<OrderPage, RepositoryError> {
        let total = self.count_for(login).await?;
        let last_page = last_page(total, per_page);
        let page = page.clamp(1, last_page);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_login, products, created_at
            FROM webshop.order
            WHERE user_login = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(login.as_str())
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<_, _>>()?;

        Ok(OrderPage {
            orders,
            page,
            last_page,
        })
    }

    /// An order, but only if `login` placed it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: OrderId,
        login: &Login,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_login, products, created_at
            FROM webshop.order
            WHERE id = $1 AND user_login = $2
            ",
        )
        .bind(id)
        .bind(login.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Start the transaction an order is placed in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if no connection is available.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, RepositoryError> {
        Ok(self.pool.begin().await?)
    }

    /// Store an order snapshot on `conn`. Inside a transaction the order
    /// only exists once the caller commits.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(conn, lines), fields(login = %login, lines = lines.len()))]
    pub async fn create(
        conn: &mut PgConnection,
        login: &Login,
        lines: &[OrderLine],
    ) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(
            r"
            INSERT INTO webshop.order (user_login, products)
            VALUES ($1, $2)
            RETURNING id, user_login, products, created_at
            ",
        )
        .bind(login.as_str())
        .bind(Json(lines))
        .fetch_one(conn)
        .await?;

        Order::try_from(row)
    }
}

/// Last 1-based page for `total` rows; an empty history still has page 1.
fn last_page(total: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (total.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page() {
        assert_eq!(last_page(0, 15), 1);
        assert_eq!(last_page(15, 15), 1);
        assert_eq!(last_page(16, 15), 2);
        assert_eq!(last_page(45, 15), 3);
    }
}
