//! Content repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::ContentBlock;

#[derive(sqlx::FromRow)]
struct ContentRow {
    name: String,
    markdown: String,
    updated_at: DateTime<Utc>,
}

impl From<ContentRow> for ContentBlock {
    fn from(row: ContentRow) -> Self {
        Self {
            name: row.name,
            markdown: row.markdown,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for editable content blocks.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A content block by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, name: &str) -> Result<Option<ContentBlock>, RepositoryError> {
        let row: Option<ContentRow> =
            sqlx::query_as("SELECT name, markdown, updated_at FROM webshop.content WHERE name = $1")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(ContentBlock::from))
    }

    /// Create or overwrite a content block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, name: &str, markdown: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO webshop.content (name, markdown, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO UPDATE SET markdown = EXCLUDED.markdown, updated_at = NOW()
            ",
        )
        .bind(name)
        .bind(markdown)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
