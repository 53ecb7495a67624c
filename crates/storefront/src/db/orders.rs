//! Order repository.
//!
//! An order is only ever written together with the cart it was taken from,
//! so an approved checkout can't leave a recorded order next to a full cart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use alpaca_core::{OrderId, PaymentMethod, PaymentStatus, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{Cart, CartLine, NewOrder, Order};

/// Order snapshots recorded at checkout.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Record `new` and save `cart` (already emptied) as one unit of work.
    ///
    /// Returns `RepositoryError::NotFound` if the cart no longer exists, in
    /// which case no order is recorded.
    async fn place_order(&self, new: &NewOrder, cart: &Cart) -> Result<Order, RepositoryError>;

    /// A user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    lines: Json<Vec<CartLine>>,
    total: Decimal,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    shipping_address: String,
    payment_reference: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            lines: r.lines.0,
            total: r.total,
            payment_status: r.payment_status,
            payment_method: r.payment_method,
            shipping_address: r.shipping_address,
            payment_reference: r.payment_reference,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(&self, new: &NewOrder, cart: &Cart) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.order
                (user_id, lines, total, payment_status, payment_method,
                 shipping_address, payment_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, lines, total, payment_status, payment_method,
                      shipping_address, payment_reference, created_at
            ",
        )
        .bind(new.user_id)
        .bind(Json(&new.lines))
        .bind(new.total)
        .bind(new.payment_status)
        .bind(new.payment_method)
        .bind(&new.shipping_address)
        .bind(&new.payment_reference)
        .fetch_one(&mut *tx)
        .await?;

        let cleared = sqlx::query(
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
        .execute(&mut *tx)
        .await?;

        // Dropping the transaction rolls the order insert back
        if cleared.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(row.into())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, lines, total, payment_status, payment_method,
                   shipping_address, payment_reference, created_at
            FROM storefront.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}
