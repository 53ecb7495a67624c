//! Checkout simulator.
//!
//! There is no payment gateway: a [`PaymentSimulator`] decides whether the
//! payment goes through. An approved checkout records an order snapshot of
//! the cart and empties it; a declined one leaves the cart as it was.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use alpaca_core::{Email, PaymentMethod, PaymentStatus, UserId};

use super::{CartService, Missing, ServiceError};
use crate::db::{OrderStore, Repositories, RepositoryError};
use crate::models::{NewOrder, Order};

/// Approval probability used when none is configured.
pub const DEFAULT_APPROVAL_RATE: f64 = 0.8;

/// Decides the outcome of a payment.
pub trait PaymentSimulator: Send + Sync {
    fn authorize(&self, amount: Decimal, method: PaymentMethod) -> PaymentStatus;
}

/// Approves payments at random with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomApproval {
    approval_rate: f64,
}

impl RandomApproval {
    /// Approve with probability `approval_rate`.
    ///
    /// Rates outside `0.0..=1.0` (or NaN) fall back to [`DEFAULT_APPROVAL_RATE`].
    #[must_use]
    pub fn new(approval_rate: f64) -> Self {
        let approval_rate = if (0.0..=1.0).contains(&approval_rate) {
            approval_rate
        } else {
            DEFAULT_APPROVAL_RATE
        };
        Self { approval_rate }
    }

    #[must_use]
    pub const fn approval_rate(&self) -> f64 {
        self.approval_rate
    }
}

impl Default for RandomApproval {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_RATE)
    }
}

impl PaymentSimulator for RandomApproval {
    fn authorize(&self, _amount: Decimal, _method: PaymentMethod) -> PaymentStatus {
        if rand::rng().random_bool(self.approval_rate) {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Declined
        }
    }
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub PaymentStatus);

impl PaymentSimulator for FixedOutcome {
    fn authorize(&self, _amount: Decimal, _method: PaymentMethod) -> PaymentStatus {
        self.0
    }
}

/// What the shopper submitted on the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub address: String,
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub paypal_email: Option<String>,
}

impl CheckoutRequest {
    /// Validate the fields required by the chosen payment method and
    /// return the masked reference stored on the order.
    fn payment_reference(&self) -> Result<String, ServiceError> {
        match self.payment_method {
            PaymentMethod::Card => {
                let raw = non_blank(self.card_number.as_deref()).ok_or_else(|| {
                    ServiceError::invalid_state("El número de tarjeta es obligatorio")
                })?;
                let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
                if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit())
                {
                    return Err(ServiceError::invalid_state(
                        "El número de tarjeta no es válido",
                    ));
                }
                let last4 = digits.get(digits.len() - 4..).unwrap_or_default();
                Ok(match non_blank(self.card_holder.as_deref()) {
                    Some(holder) => format!("**** {last4} ({holder})"),
                    None => format!("**** {last4}"),
                })
            }
            PaymentMethod::Paypal => {
                let raw = non_blank(self.paypal_email.as_deref()).ok_or_else(|| {
                    ServiceError::invalid_state("El correo de PayPal es obligatorio")
                })?;
                let email = Email::parse(raw).map_err(|_| {
                    ServiceError::invalid_state("El correo de PayPal no es válido")
                })?;
                Ok(email.into_inner())
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Result of a checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub status: PaymentStatus,
    /// Cart total at the time of checkout.
    pub total: Decimal,
    /// The recorded order, present only when the payment was approved.
    pub order: Option<Order>,
}

impl CheckoutOutcome {
    #[must_use]
    pub const fn approved(&self) -> bool {
        self.status.is_approved()
    }
}

/// Checkout for a single request.
pub struct CheckoutService<'a> {
    carts: CartService<'a>,
    orders: &'a dyn OrderStore,
    payments: &'a dyn PaymentSimulator,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub fn new(repos: &'a Repositories, payments: &'a dyn PaymentSimulator) -> Self {
        Self {
            carts: CartService::new(repos),
            orders: repos.orders.as_ref(),
            payments,
        }
    }

    /// Pay for the user's current cart.
    ///
    /// A declined payment is returned as an outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` if the address or the payment
    /// details for the chosen method are missing or malformed.
    /// Returns `ServiceError::NotFound` if the user doesn't exist, or the
    /// cart disappeared before the order was recorded (nothing is written).
    #[instrument(skip(self, request), fields(method = %request.payment_method))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(ServiceError::invalid_state(
                "La dirección de envío es obligatoria",
            ));
        }
        let payment_reference = request.payment_reference()?;

        let mut cart = self.carts.get_or_create_cart(user_id).await?;
        cart.recompute_total();
        let total = cart.total;

        let status = self.payments.authorize(total, request.payment_method);
        if !status.is_approved() {
            info!(cart_id = %cart.id, %total, "Payment declined");
            return Ok(CheckoutOutcome {
                status,
                total,
                order: None,
            });
        }

        let new_order = NewOrder {
            user_id,
            lines: std::mem::take(&mut cart.lines),
            total,
            payment_status: status,
            payment_method: request.payment_method,
            shipping_address: address.to_owned(),
            payment_reference,
        };
        cart.clear();
        cart.updated_at = Utc::now();

        let order = self
            .orders
            .place_order(&new_order, &cart)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound(Missing::Cart),
                other => other.into(),
            })?;

        info!(order_id = %order.id, %total, "Payment approved, order recorded");
        Ok(CheckoutOutcome {
            status,
            total,
            order: Some(order),
        })
    }

    /// A user's past orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn order_history(&self, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.orders_for_user(user_id).await?)
    }
}
