//! Catalog and discount imports from the command line.
//!
//! Same parsing as the admin upload forms, for scheduled imports of the ERP
//! exports.
//!
//! ```bash
//! wtg-cli import products artikelen.csv
//! wtg-cli import discounts kortingen.csv
//! ```

use std::path::Path;

use wtg_webshop::db::{DiscountRepository, ProductRepository};
use wtg_webshop::services::import;

use super::{CommandError, connect};

fn read(path: &Path) -> Result<String, CommandError> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(import::decode(&bytes))
}

/// Replace the catalog with a product export.
pub async fn products(path: &Path) -> Result<u64, CommandError> {
    let products = import::parse_products(&read(path)?)?;
    let pool = connect().await?;

    let count = ProductRepository::new(&pool).replace_all(&products).await?;
    tracing::info!("Imported {} products from {}", count, path.display());
    Ok(count)
}

/// Replace all discounts with a discount export.
pub async fn discounts(path: &Path) -> Result<u64, CommandError> {
    let rows = import::parse_discounts(&read(path)?)?;
    let pool = connect().await?;

    let count = DiscountRepository::new(&pool).replace_all(&rows).await?;
    tracing::info!("Imported {} discounts from {}", count, path.display());
    Ok(count)
}
