//! Cart engine.
//!
//! Every mutation is a read-modify-write of the user's cart document:
//! load (creating the cart lazily), apply the change through the [`Cart`]
//! model so lines and totals stay consistent, then save lines and total
//! together.

use chrono::Utc;
use tracing::{info, instrument};

use alpaca_core::{ProductId, UserId};

use super::{Missing, ServiceError};
use crate::db::{CartStore, Catalog, Repositories, RepositoryError, UserDirectory};
use crate::models::{Cart, CartLimit, MAX_LINE_QUANTITY, User};

/// Message shown when a second cart is requested for a user.
const CART_EXISTS: &str = "El carrito ya existe";
const QUANTITY_LIMIT: &str = "La cantidad excede el máximo";
const TOTAL_LIMIT: &str = "El total del carrito excede el máximo";

/// Cart operations for a single request.
pub struct CartService<'a> {
    catalog: &'a dyn Catalog,
    users: &'a dyn UserDirectory,
    carts: &'a dyn CartStore,
}

impl<'a> CartService<'a> {
    /// Create a cart service over the given repositories.
    #[must_use]
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            catalog: repos.catalog.as_ref(),
            users: repos.users.as_ref(),
            carts: repos.carts.as_ref(),
        }
    }

    /// Create an empty cart for a user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    /// Returns `ServiceError::InvalidState` if the user already has a cart.
    #[instrument(skip(self))]
    pub async fn create_cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        self.require_user(user_id).await?;

        if self.carts.get_cart_by_user(user_id).await?.is_some() {
            return Err(ServiceError::invalid_state(CART_EXISTS));
        }

        self.insert_cart(user_id).await
    }

    /// Return the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        self.require_user(user_id).await?;

        if let Some(cart) = self.carts.get_cart_by_user(user_id).await? {
            return Ok(cart);
        }

        match self.insert_cart(user_id).await {
            // Another request created it between our read and insert.
            Err(ServiceError::InvalidState(_)) => self
                .carts
                .get_cart_by_user(user_id)
                .await?
                .ok_or(ServiceError::NotFound(Missing::Cart)),
            other => other,
        }
    }

    /// Add `quantity` units of a product to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` if `quantity` is zero, or the
    /// line would pass [`MAX_LINE_QUANTITY`] units or the cart total its
    /// storable maximum.
    /// Returns `ServiceError::NotFound` if the product or user doesn't exist.
    /// Returns `ServiceError::InvalidPrice` if the product's price is not positive.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::invalid_state(
                "La cantidad debe ser al menos 1",
            ));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::invalid_state(QUANTITY_LIMIT));
        }

        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or(ServiceError::NotFound(Missing::Product))?;

        if !product.price.is_positive() {
            return Err(ServiceError::InvalidPrice(product_id));
        }

        let mut cart = self.get_or_create_cart(user_id).await?;
        cart.add_line(&product, quantity).map_err(|limit| {
            ServiceError::invalid_state(match limit {
                CartLimit::Quantity => QUANTITY_LIMIT,
                CartLimit::Total => TOTAL_LIMIT,
            })
        })?;
        self.save(&mut cart).await?;

        info!(
            cart_id = %cart.id,
            lines = cart.lines.len(),
            total = %cart.total,
            "Item added to cart"
        );
        Ok(cart)
    }

    /// Remove a product's line from the user's cart.
    ///
    /// Removing a product that is not in the cart leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self.get_or_create_cart(user_id).await?;

        if cart.remove_line(product_id) {
            self.save(&mut cart).await?;
            info!(cart_id = %cart.id, total = %cart.total, "Item removed from cart");
        }

        Ok(cart)
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        let mut cart = self.get_or_create_cart(user_id).await?;
        cart.clear();
        self.save(&mut cart).await?;
        Ok(cart)
    }

    async fn require_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound(Missing::User))
    }

    async fn insert_cart(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        let cart = self
            .carts
            .create_cart(user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::invalid_state(CART_EXISTS),
                RepositoryError::NotFound => ServiceError::NotFound(Missing::User),
                other => other.into(),
            })?;

        self.users
            .link_cart(user_id, cart.id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound(Missing::User),
                other => other.into(),
            })?;

        info!(cart_id = %cart.id, "Cart created");
        Ok(cart)
    }

    pub(crate) async fn save(&self, cart: &mut Cart) -> Result<(), ServiceError> {
        cart.updated_at = Utc::now();
        self.carts.save_cart(cart).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::NotFound(Missing::Cart),
            other => other.into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::fixture;

    fn assert_total_matches_lines(cart: &Cart) {
        let sum: Decimal = cart.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(cart.total, sum);
    }

    #[tokio::test]
    async fn test_create_cart_twice_is_invalid_state() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);

        let cart = carts.create_cart(fx.user.id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);

        let err = carts.create_cart(fx.user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(ref m) if m == CART_EXISTS));
    }

    #[tokio::test]
    async fn test_create_cart_links_user() {
        let fx = fixture().await;
        let cart = CartService::new(&fx.repos)
            .create_cart(fx.user.id)
            .await
            .unwrap();

        let user = fx.repos.users.get_user(fx.user.id).await.unwrap().unwrap();
        assert_eq!(user.cart_id, Some(cart.id));
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);

        let first = carts.get_or_create_cart(fx.user.id).await.unwrap();
        let second = carts.get_or_create_cart(fx.user.id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let fx = fixture().await;
        let err = CartService::new(&fx.repos)
            .get_or_create_cart(UserId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Missing::User)));
    }

    #[tokio::test]
    async fn test_add_same_product_twice_merges() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);

        carts.add_item(fx.user.id, fx.scarf.id, 2).await.unwrap();
        let cart = carts.add_item(fx.user.id, fx.scarf.id, 3).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.lines[0].subtotal, fx.scarf.price.line_total(5).unwrap());
        assert_total_matches_lines(&cart);
    }

    #[tokio::test]
    async fn test_add_past_quantity_limit_keeps_cart() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);

        let err = carts
            .add_item(fx.user.id, fx.scarf.id, u32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(ref m) if m == QUANTITY_LIMIT));

        carts
            .add_item(fx.user.id, fx.scarf.id, MAX_LINE_QUANTITY)
            .await
            .unwrap();
        let err = carts.add_item(fx.user.id, fx.scarf.id, 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(ref m) if m == QUANTITY_LIMIT));

        let stored = carts.get_or_create_cart(fx.user.id).await.unwrap();
        assert_eq!(stored.lines[0].quantity, MAX_LINE_QUANTITY);
        assert_total_matches_lines(&stored);
    }

    #[tokio::test]
    async fn test_add_persists_lines_and_total() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);

        carts.add_item(fx.user.id, fx.scarf.id, 1).await.unwrap();
        carts.add_item(fx.user.id, fx.sweater.id, 2).await.unwrap();

        let stored = fx
            .repos
            .carts
            .get_cart_by_user(fx.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(
            stored.total,
            fx.scarf.price.line_total(1).unwrap() + fx.sweater.price.line_total(2).unwrap()
        );
        assert_total_matches_lines(&stored);
    }

    #[tokio::test]
    async fn test_add_missing_product_is_not_found() {
        let fx = fixture().await;
        let err = CartService::new(&fx.repos)
            .add_item(fx.user.id, ProductId::new(4040), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Missing::Product)));
    }

    #[tokio::test]
    async fn test_add_unpriced_product_is_invalid_price() {
        let fx = fixture().await;
        let err = CartService::new(&fx.repos)
            .add_item(fx.user.id, fx.unpriced.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPrice(id) if id == fx.unpriced.id));
    }

    #[tokio::test]
    async fn test_add_zero_quantity_is_rejected() {
        let fx = fixture().await;
        let err = CartService::new(&fx.repos)
            .add_item(fx.user.id, fx.scarf.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_product_is_noop() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);
        let before = carts.add_item(fx.user.id, fx.scarf.id, 2).await.unwrap();

        let after = carts
            .remove_item(fx.user.id, fx.sweater.id)
            .await
            .unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_remove_recomputes_total() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);
        carts.add_item(fx.user.id, fx.scarf.id, 2).await.unwrap();
        carts.add_item(fx.user.id, fx.sweater.id, 1).await.unwrap();

        let cart = carts.remove_item(fx.user.id, fx.scarf.id).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total, fx.sweater.price.line_total(1).unwrap());
        assert_total_matches_lines(&cart);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let fx = fixture().await;
        let carts = CartService::new(&fx.repos);
        carts.add_item(fx.user.id, fx.scarf.id, 2).await.unwrap();

        let cart = carts.clear_cart(fx.user.id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);

        let stored = carts.get_or_create_cart(fx.user.id).await.unwrap();
        assert!(stored.is_empty());
    }
}
