//! In-process store.
//!
//! Used when no database URL is configured (demo mode) and by the service
//! and route tests. Mirrors the constraints the `PostgreSQL` schema enforces:
//! unique emails, unique category names, one cart per user, and foreign keys
//! from products to categories and from carts to users.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use alpaca_core::{CartId, CategoryId, Email, OrderId, ProductId, UserId};

use super::{CartStore, Catalog, OrderStore, RepositoryError, UserDirectory};
use crate::models::{
    Cart, Category, NewCategory, NewOrder, NewProduct, NewUser, Order, Product, User,
};

/// Store that keeps every table in memory behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    sequences: Sequences,
}

/// Last id handed out per table.
#[derive(Debug, Default)]
struct Sequences {
    category: i32,
    product: i32,
    user: i32,
    cart: i32,
    order: i32,
}

fn next_id(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn products_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == new.name) {
            return Err(RepositoryError::Conflict(
                "category already exists".to_owned(),
            ));
        }

        let category = Category {
            id: CategoryId::new(next_id(&mut tables.sequences.category)),
            name: new.name.clone(),
            description: new.description.clone(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&new.category_id) {
            return Err(RepositoryError::NotFound);
        }

        let product = Product {
            id: ProductId::new(next_id(&mut tables.sequences.product)),
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            category_id: new.category_id,
            stock: new.stock,
            attributes: new.attributes.clone(),
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(next_id(&mut tables.sequences.user)),
            name: new.name.clone(),
            email: new.email.clone(),
            address: new.address.clone(),
            phone: new.phone.clone(),
            cart_id: None,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn link_cart(&self, user_id: UserId, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.cart_id = Some(cart_id);
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables.read().await.carts.get(&user_id).cloned())
    }

    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.carts.contains_key(&user_id) {
            return Err(RepositoryError::Conflict("cart already exists".to_owned()));
        }

        let cart = Cart::empty(
            CartId::new(next_id(&mut tables.sequences.cart)),
            user_id,
            Utc::now(),
        );
        tables.carts.insert(user_id, cart.clone());
        Ok(cart)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.carts.get_mut(&cart.user_id) {
            Some(stored) if stored.id == cart.id => {
                stored.clone_from(cart);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, new: &NewOrder, cart: &Cart) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.carts.get_mut(&cart.user_id) {
            Some(stored) if stored.id == cart.id => stored.clone_from(cart),
            _ => return Err(RepositoryError::NotFound),
        }

        let order = Order {
            id: OrderId::new(next_id(&mut tables.sequences.order)),
            user_id: new.user_id,
            lines: new.lines.clone(),
            total: new.total,
            payment_status: new.payment_status,
            payment_method: new.payment_method,
            shipping_address: new.shipping_address.clone(),
            payment_reference: new.payment_reference.clone(),
            created_at: Utc::now(),
        };
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}
