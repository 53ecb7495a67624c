//! Catalog domain types: categories and products.

use serde::{Deserialize, Serialize};

use alpaca_core::{CategoryId, Price, ProductId};

/// A product category shown on the home page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
}

/// Free-form product attributes.
///
/// Stored as a JSON document alongside the product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProductAttributes {
    pub material: Option<String>,
    #[serde(rename = "tallas")]
    pub sizes: Vec<String>,
    #[serde(rename = "colores")]
    pub colors: Vec<String>,
}

/// A product for sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(rename = "categoria")]
    pub category_id: CategoryId,
    pub stock: i32,
    #[serde(rename = "atributos")]
    pub attributes: ProductAttributes,
}

/// Data needed to create a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
}

/// Data needed to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: CategoryId,
    pub stock: i32,
    pub attributes: ProductAttributes,
}
