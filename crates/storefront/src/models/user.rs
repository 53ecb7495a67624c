//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use alpaca_core::{CartId, Email, UserId};

/// A registered shopper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Email address, unique across users.
    pub email: Email,
    /// Default shipping address.
    #[serde(rename = "direccion")]
    pub address: String,
    /// Contact phone number.
    #[serde(rename = "telefono")]
    pub phone: String,
    /// Cart linked to this user, once one has been created.
    #[serde(rename = "carrito_id")]
    pub cart_id: Option<CartId>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub phone: String,
}
