//! Cart repository.
//!
//! A cart is a single document per user: its line list is stored as JSONB
//! next to the total, and every mutation rewrites both together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use alpaca_core::{CartId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{Cart, CartLine};

/// Per-user cart persistence.
///
/// There is no cross-request locking: a load followed by a save can lose a
/// concurrent writer's changes (last write wins).
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart for `user_id`.
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a cart and
    /// `RepositoryError::NotFound` if the user doesn't exist.
    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Overwrite the cart's lines and total.
    ///
    /// Returns `RepositoryError::NotFound` if the cart no longer exists.
    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    lines: Json<Vec<CartLine>>,
    total: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            lines: r.lines.0,
            total: r.total,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, lines, total, updated_at
            FROM storefront.cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO storefront.cart (user_id)
            VALUES ($1)
            RETURNING id, user_id, lines, total, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "cart")
        })?;

        Ok(row.into())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart
            SET lines = $1, total = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(Json(&cart.lines))
        .bind(cart.total)
        .bind(cart.updated_at)
        .bind(cart.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
