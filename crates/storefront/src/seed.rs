//! Catalog seeding from YAML.
//!
//! The file lists categories with their products nested underneath:
//!
//! ```yaml
//! categorias:
//!   - nombre: Chompas
//!     productos:
//!       - nombre: Chompa Andina
//!         precio: "189.90"
//!         stock: 12
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use alpaca_core::Price;

use crate::db::{Catalog, RepositoryError};
use crate::models::{NewCategory, NewProduct, ProductAttributes};

/// Demo catalog bundled with the binary.
pub const DEMO_CATALOG: &str = include_str!("../seed/catalog.yaml");

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Parsed catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(rename = "categorias")]
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "productos", default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(default)]
    pub stock: i32,
    #[serde(rename = "atributos", default)]
    pub attributes: ProductAttributes,
}

/// What a seeding run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_skipped: usize,
    pub products_created: usize,
}

impl CatalogSeed {
    /// Parse a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the YAML is malformed or a price is negative.
    pub fn parse(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The bundled demo catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the bundled file is invalid.
    pub fn demo() -> Result<Self, SeedError> {
        Self::parse(DEMO_CATALOG)
    }

    /// Create every category and its products.
    ///
    /// A category whose name already exists is skipped together with its
    /// products, so running the same file twice does not duplicate items.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Repository` on the first store failure other than
    /// a duplicate category.
    pub async fn load_into(&self, catalog: &dyn Catalog) -> Result<SeedSummary, SeedError> {
        let mut summary = SeedSummary::default();

        for category_seed in &self.categories {
            let new_category = NewCategory {
                name: category_seed.name.clone(),
                description: category_seed.description.clone(),
            };

            let category = match catalog.create_category(&new_category).await {
                Ok(category) => category,
                Err(RepositoryError::Conflict(_)) => {
                    warn!(category = %category_seed.name, "Category exists, skipping");
                    summary.categories_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            summary.categories_created += 1;

            for product_seed in &category_seed.products {
                let new_product = NewProduct {
                    name: product_seed.name.clone(),
                    description: product_seed.description.clone(),
                    price: product_seed.price,
                    category_id: category.id,
                    stock: product_seed.stock,
                    attributes: product_seed.attributes.clone(),
                };
                catalog.create_product(&new_product).await?;
                summary.products_created += 1;
            }
        }

        info!(
            categories = summary.categories_created,
            skipped = summary.categories_skipped,
            products = summary.products_created,
            "Catalog seeded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_demo_catalog_parses() {
        let seed = CatalogSeed::demo().unwrap();
        assert!(!seed.categories.is_empty());
        assert!(seed.categories.iter().all(|c| !c.name.is_empty()));
    }

    #[test]
    fn test_negative_price_rejected() {
        let yaml = r#"
categorias:
  - nombre: Gorros
    productos:
      - nombre: Chullo
        precio: "-1.00"
"#;
        assert!(matches!(CatalogSeed::parse(yaml), Err(SeedError::Parse(_))));
    }

    #[tokio::test]
    async fn test_reseeding_skips_existing_categories() {
        let store = MemoryStore::new();
        let seed = CatalogSeed::demo().unwrap();

        let first = seed.load_into(&store).await.unwrap();
        assert_eq!(first.categories_created, seed.categories.len());
        assert_eq!(first.categories_skipped, 0);

        let second = seed.load_into(&store).await.unwrap();
        assert_eq!(second.categories_created, 0);
        assert_eq!(second.categories_skipped, seed.categories.len());
        assert_eq!(
            store.list_products().await.unwrap().len(),
            first.products_created
        );
    }
}
