//! Discount sheets and discount files for a customer.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use wtg_core::{DiscountSheet, FileType, IccHeader, Login};

use crate::db::{DiscountRepository, RepositoryError};

/// A rendered discount file, ready to download or attach.
#[derive(Debug, Clone)]
pub struct DiscountFile {
    pub file_type: FileType,
    pub file_name: String,
    /// Encoded as the file type requires.
    pub content: Vec<u8>,
    /// Number of discount rows in the file.
    pub rows: usize,
}

/// Resolve the exportable discounts of `login`.
///
/// # Errors
///
/// Returns `RepositoryError` if the rows cannot be loaded.
pub async fn sheet_for(pool: &PgPool, login: &Login) -> Result<DiscountSheet, RepositoryError> {
    let rows = DiscountRepository::new(pool).rows_for(login).await?;
    Ok(DiscountSheet::resolve(login, rows))
}

/// Build the discount file of a customer.
///
/// # Errors
///
/// Returns `RepositoryError` if the rows cannot be loaded.
#[instrument(skip(pool, gln, company), fields(login = %login, file_type = %file_type))]
pub async fn build_file(
    pool: &PgPool,
    gln: &str,
    login: &Login,
    company: &str,
    file_type: FileType,
    today: NaiveDate,
) -> Result<DiscountFile, RepositoryError> {
    let sheet = sheet_for(pool, login).await?;
    let header = IccHeader {
        gln,
        login,
        company,
    };

    let content = file_type.encode(&file_type.render(&sheet, &header, today));
    tracing::info!(rows = sheet.len(), "Discount file generated");

    Ok(DiscountFile {
        file_type,
        file_name: file_type.file_name(login),
        content,
        rows: sheet.len(),
    })
}
