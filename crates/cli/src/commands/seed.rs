//! Seed the catalog from YAML.
//!
//! Categories that already exist (by name) are skipped with their products,
//! so seeding the same file twice is harmless.

use std::path::Path;

use tracing::info;

use alpaca_storefront::db::{self, PgStore};
use alpaca_storefront::seed::{CatalogSeed, SeedSummary};

use super::{CommandError, database_url};

/// Seed from a catalog file.
///
/// The file is parsed before connecting, so a malformed file never touches
/// the database.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, or a database
/// operation fails.
pub async fn from_file(file_path: &str) -> Result<(), CommandError> {
    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed = CatalogSeed::parse(&content)?;

    load(&seed).await
}

/// Seed the demo catalog bundled with the storefront.
///
/// # Errors
///
/// Returns an error if a database operation fails.
pub async fn demo() -> Result<(), CommandError> {
    load(&CatalogSeed::demo()?).await
}

async fn load(seed: &CatalogSeed) -> Result<(), CommandError> {
    info!(categories = seed.categories.len(), "Parsed catalog");

    let pool = db::create_pool(&database_url()?).await?;
    let store = PgStore::new(pool);

    let SeedSummary {
        categories_created,
        categories_skipped,
        products_created,
    } = seed.load_into(&store).await?;

    info!(
        categories_created,
        categories_skipped, products_created, "Seeding complete"
    );
    Ok(())
}
