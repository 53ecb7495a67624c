//! Catalog repository: categories and products.

use async_trait::async_trait;
use sqlx::types::Json;

use alpaca_core::{CategoryId, Price, ProductId};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{Category, NewCategory, NewProduct, Product, ProductAttributes};

/// Read and create operations over the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// All products, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Products in one category, ordered by id.
    async fn products_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Create a category.
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError>;

    /// Create a product.
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    category_id: CategoryId,
    stock: i32,
    attributes: Json<ProductAttributes>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            category_id: r.category_id,
            stock: r.stock,
            attributes: r.attributes.0,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id, stock, attributes";

#[async_trait]
impl Catalog for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description
            FROM storefront.category
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description
            FROM storefront.category
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY id ASC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn products_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE category_id = $1 ORDER BY id ASC"
        ))
        .bind(category_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO storefront.category (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            ",
        )
        .bind(&new.name)
        .bind(new.description.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;

        Ok(row.into())
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product (name, description, price, category_id, stock, attributes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(new.price)
        .bind(new.category_id)
        .bind(new.stock)
        .bind(Json(&new.attributes))
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }
}
