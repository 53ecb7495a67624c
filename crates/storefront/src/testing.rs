//! Shared fixtures for service and route tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use alpaca_core::{Email, Price};

use crate::db::{Catalog, MemoryStore, Repositories, UserDirectory};
use crate::models::{NewCategory, NewProduct, NewUser, Product, ProductAttributes, User};

/// A memory-backed store with one shopper and a small catalog.
pub struct Fixture {
    pub repos: Repositories,
    pub user: User,
    /// Priced at 65.50.
    pub scarf: Product,
    /// Priced at 189.90.
    pub sweater: Product,
    /// Priced at zero, so it can't be added to a cart.
    pub unpriced: Product,
}

fn product(name: &str, cents: i64, category: &crate::models::Category) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        description: None,
        price: Price::new(Decimal::new(cents, 2)).unwrap(),
        category_id: category.id,
        stock: 10,
        attributes: ProductAttributes {
            material: Some("alpaca".to_owned()),
            ..ProductAttributes::default()
        },
    }
}

pub async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());

    let user = store
        .create_user(&NewUser {
            name: "Rosa Mamani".to_owned(),
            email: Email::parse("rosa@alpaca.pe").unwrap(),
            address: "Av. El Sol 123, Cusco".to_owned(),
            phone: "984000111".to_owned(),
        })
        .await
        .unwrap();

    let category = store
        .create_category(&NewCategory {
            name: "Accesorios".to_owned(),
            description: Some("Bufandas y chullos".to_owned()),
        })
        .await
        .unwrap();

    let scarf = store
        .create_product(&product("Bufanda Inti", 6550, &category))
        .await
        .unwrap();
    let sweater = store
        .create_product(&product("Chompa Andina", 18990, &category))
        .await
        .unwrap();
    let unpriced = store
        .create_product(&product("Bufanda Muestra", 0, &category))
        .await
        .unwrap();

    Fixture {
        repos: Repositories::from_store(store),
        user,
        scarf,
        sweater,
        unpriced,
    }
}
