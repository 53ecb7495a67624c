//! User repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use alpaca_core::{CartId, Email, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{NewUser, User};

/// Create and look up registered users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create_user(&self, new: &NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Record `cart_id` as the user's cart.
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    async fn link_cart(&self, user_id: UserId, cart_id: CartId) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: Email,
    address: String,
    phone: String,
    cart_id: Option<CartId>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            address: r.address,
            phone: r.phone,
            cart_id: r.cart_id,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_user(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.user (name, email, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, address, phone, cart_id, created_at
            ",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.phone)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        Ok(row.into())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, address, phone, cart_id, created_at
            FROM storefront.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, address, phone, cart_id, created_at
            FROM storefront.user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn link_cart(&self, user_id: UserId, cart_id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.user
            SET cart_id = $1
            WHERE id = $2
            ",
        )
        .bind(cart_id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
