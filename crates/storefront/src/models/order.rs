//! Order domain types.
//!
//! An order is an immutable snapshot of a cart taken at checkout, plus the
//! payment outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use alpaca_core::{OrderId, PaymentMethod, PaymentStatus, UserId};

use super::CartLine;

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "usuario")]
    pub user_id: UserId,
    #[serde(rename = "productos")]
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    #[serde(rename = "estado_pago")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "metodo_pago")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "direccion_envio")]
    pub shipping_address: String,
    /// Masked card number or PayPal account, never the full card number.
    #[serde(rename = "referencia_pago")]
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to record an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub payment_reference: String,
}
