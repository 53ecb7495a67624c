//! Order history.

use axum::{
    Json,
    extract::State,
};
use tracing::instrument;

use alpaca_core::UserId;

use crate::error::Result;
use crate::extract::Path;
use crate::models::Order;
use crate::services::{Missing, ServiceError};
use crate::state::AppState;

/// A user's orders as JSON, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    if state.repos().users.get_user(user_id).await?.is_none() {
        return Err(ServiceError::NotFound(Missing::User).into());
    }
    Ok(Json(state.checkout().order_history(user_id).await?))
}
