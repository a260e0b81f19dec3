//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wtg-cli migrate
//! ```
//!
//! Runs the webshop migrations from `crates/webshop/migrations/`, then creates
//! the session table used by tower-sessions.
//!
//! # Environment Variables
//!
//! - `WEBSHOP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run all webshop migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running webshop migrations...");
    sqlx::migrate!("../webshop/migrations").run(&pool).await?;

    tracing::info!("Creating session store...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Webshop migrations complete!");
    Ok(())
}
