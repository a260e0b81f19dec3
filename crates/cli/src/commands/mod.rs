//! CLI subcommands.

pub mod import;
pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] wtg_webshop::db::RepositoryError),

    /// Password hashing or validation failed.
    #[error("{0}")]
    Auth(#[from] wtg_webshop::services::AuthError),

    /// Malformed import file.
    #[error("{0}")]
    Import(#[from] wtg_webshop::services::ImportError),

    /// Reading an input file failed.
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Invalid argument.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Connect to the webshop database.
///
/// Reads `WEBSHOP_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("WEBSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("WEBSHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to webshop database...");
    let pool = wtg_webshop::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
