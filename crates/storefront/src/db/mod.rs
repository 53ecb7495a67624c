//! Persistence for the storefront.
//!
//! # Repositories
//!
//! Each concern is a trait so the services never see which store backs them:
//!
//! - [`Catalog`] - categories and products
//! - [`UserDirectory`] - registered users
//! - [`CartStore`] - one cart document per user
//! - [`OrderStore`] - order snapshots taken at checkout
//!
//! Two stores implement all four: [`PgStore`] (`PostgreSQL`, cart lines and
//! product attributes as JSONB documents) and [`MemoryStore`] (used when no
//! database is configured, and by tests).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p alpaca-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod memory;
pub mod orders;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartStore;
pub use catalog::Catalog;
pub use memory::MemoryStore;
pub use orders::OrderStore;
pub use users::UserDirectory;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// `PostgreSQL`-backed store. Implements every repository trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// The repositories used by the services, as trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn Catalog>,
    pub users: Arc<dyn UserDirectory>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Repositories {
    /// Use one store for every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: Catalog + UserDirectory + CartStore + OrderStore + 'static,
    {
        Self {
            catalog: store.clone(),
            users: store.clone(),
            carts: store.clone(),
            orders: store,
        }
    }

    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
