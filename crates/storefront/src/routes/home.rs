//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, CurrentUser};
use crate::state::AppState;

/// Category index template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: Option<CurrentUser>,
    pub categories: Vec<Category>,
}

/// Send logged-in shoppers to their cart; show everyone else the categories.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    if let Some(user) = user {
        return Ok(Redirect::to(&format!("/carrito/{}", user.id)).into_response());
    }

    let categories = state.repos().catalog.list_categories().await?;
    Ok(IndexTemplate {
        user: None,
        categories,
    }
    .into_response())
}
