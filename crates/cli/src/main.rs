//! Alpaca CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! alpaca-cli migrate
//!
//! # Load a catalog file (categories with nested products)
//! alpaca-cli seed crates/storefront/seed/catalog.yaml
//!
//! # Load the catalog bundled with the storefront
//! alpaca-cli seed --demo
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "alpaca-cli")]
#[command(author, version, about = "Alpaca storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog YAML file
        #[arg(required_unless_present = "demo")]
        file: Option<String>,

        /// Use the demo catalog bundled with the storefront
        #[arg(long, conflicts_with = "file")]
        demo: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await,
        Commands::Seed { file, demo } => match file {
            Some(path) if !demo => commands::seed::from_file(&path).await,
            _ => commands::seed::demo().await,
        },
    }
}
