//! WTG CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema + session store)
//! wtg-cli migrate
//!
//! # Create a user
//! wtg-cli user create -l 13370 -c "Company" -p secret123 [-e mail@example.com] [--admin]
//!
//! # Reset a password
//! wtg-cli user password -l 13370 -p secret123
//!
//! # Import ERP exports
//! wtg-cli import products artikelen.csv
//! wtg-cli import discounts kortingen.csv
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wtg-cli")]
#[command(author, version, about = "WTG webshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage webshop users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Replace the catalog or the discounts from an ERP export
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Debtor number
        #[arg(short, long)]
        login: String,

        /// Company name
        #[arg(short, long)]
        company: String,

        /// Email address for discount files
        #[arg(short, long)]
        email: Option<String>,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Grant access to the admin back office
        #[arg(long)]
        admin: bool,
    },
    /// Set a new password
    Password {
        /// Debtor number
        #[arg(short, long)]
        login: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Product export: `number;name;series;group;price;special;clearance`
    Products { file: PathBuf },
    /// Discount export: `table;login;product;group_desc;product_desc;discount`
    Discounts { file: PathBuf },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                login,
                company,
                email,
                password,
                admin,
            } => {
                commands::user::create(&login, &company, email.as_deref(), &password, admin)
                    .await?;
            }
            UserAction::Password { login, password } => {
                commands::user::set_password(&login, &password).await?;
            }
        },
        Commands::Import { target } => match target {
            ImportTarget::Products { file } => {
                commands::import::products(&file).await?;
            }
            ImportTarget::Discounts { file } => {
                commands::import::discounts(&file).await?;
            }
        },
    }
    Ok(())
}
