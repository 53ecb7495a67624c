//! Session middleware configuration.
//!
//! Sessions are kept in `PostgreSQL` when the storefront has a database and
//! in process memory otherwise.

use sqlx::PgPool;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "alpaca_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer backed by the `tower_sessions.session` table.
#[must_use]
pub fn postgres_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The sessions table is created by the storefront migrations
    configure(SessionManagerLayer::new(PostgresStore::new(pool.clone())), config)
}

/// Session layer that lives as long as the process.
#[must_use]
pub fn memory_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    configure(SessionManagerLayer::new(MemoryStore::default()), config)
}

fn configure<S: SessionStore>(
    layer: SessionManagerLayer<S>,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    let is_secure = config.base_url.scheme() == "https";

    layer
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
