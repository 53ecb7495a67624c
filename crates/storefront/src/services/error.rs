//! Service error types.

use thiserror::Error;

use alpaca_core::ProductId;

use crate::db::RepositoryError;

/// What a [`ServiceError::NotFound`] could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    User,
    Product,
    Cart,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Product => write!(f, "product"),
            Self::Cart => write!(f, "cart"),
        }
    }
}

/// Errors raised by the cart, checkout and user services.
///
/// `InvalidState` carries the message shown to the shopper.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A user, product or cart does not exist.
    #[error("{0} not found")]
    NotFound(Missing),

    /// The request conflicts with current state or is missing a field.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The product has a zero price and cannot be sold.
    #[error("product {0} has no price available")]
    InvalidPrice(ProductId),

    /// Repository/database error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}
