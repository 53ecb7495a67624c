//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::Repositories;
use crate::services::{CartService, CheckoutService, PaymentSimulator, UserService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Services are built per request from the
/// shared repositories.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repos: Repositories,
    payments: Arc<dyn PaymentSimulator>,
    /// Present when running against `PostgreSQL`; used by the readiness check.
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        repos: Repositories,
        payments: Arc<dyn PaymentSimulator>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                payments,
                pool,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(&self.inner.repos)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(&self.inner.repos, self.inner.payments.as_ref())
    }

    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.inner.repos)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("repos", &self.inner.repos)
            .field("postgres", &self.inner.pool.is_some())
            .finish_non_exhaustive()
    }
}
