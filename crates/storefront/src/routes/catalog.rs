//! Catalog pages and the read-only catalog API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
};
use tracing::instrument;

use alpaca_core::{CategoryId, ProductId};

use crate::error::{AppError, Result};
use crate::extract::Path;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, CurrentUser, Product};
use crate::state::AppState;

/// Products-in-category page template.
#[derive(Template, WebTemplate)]
#[template(path = "productos.html")]
pub struct ProductsTemplate {
    pub user: Option<CurrentUser>,
    pub category: Category,
    pub products: Vec<Product>,
}

fn category_not_found() -> AppError {
    AppError::NotFound("Categoría no encontrada".to_string())
}

/// Display the products of a category.
#[instrument(skip(state, user))]
pub async fn products_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(category_id): Path<CategoryId>,
) -> Result<ProductsTemplate> {
    let catalog = &state.repos().catalog;
    let category = catalog
        .get_category(category_id)
        .await?
        .ok_or_else(category_not_found)?;
    let products = catalog.products_in_category(category_id).await?;

    Ok(ProductsTemplate {
        user,
        category,
        products,
    })
}

/// `GET /api/categorias`
pub async fn api_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.repos().catalog.list_categories().await?))
}

/// `GET /api/productos`
pub async fn api_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.repos().catalog.list_products().await?))
}

/// `GET /api/productos/{id}`
pub async fn api_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .repos()
        .catalog
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_string()))
}
