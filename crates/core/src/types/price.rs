//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are never negative. A zero price is representable (an
//! item can be listed before it is priced) but cannot be added to a cart.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative unit price in the store currency.
///
/// Serialized as a decimal string (e.g. `"12.50"`) so no precision is lost
/// through JSON.
///
/// ```
/// use alpaca_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1250, 2)).unwrap();
/// assert_eq!(price.line_total(3), Some(Decimal::new(3750, 2)));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Price of `quantity` units, or `None` if it doesn't fit in a `Decimal`.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_valid_but_not_positive() {
        let price = Price::new(Decimal::ZERO).unwrap();
        assert!(!price.is_positive());
        assert_eq!(price, Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        let err = Price::new(Decimal::new(-500, 2)).unwrap_err();
        assert_eq!(err, PriceError::Negative(Decimal::new(-500, 2)));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(45, 0)).unwrap();
        assert_eq!(price.to_string(), "$45.00");
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(price.line_total(1), Some(Decimal::MAX));
        assert_eq!(price.line_total(u32::MAX), None);
    }

    #[test]
    fn test_json_is_string_and_validated() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.99\"");
        assert!(serde_json::from_str::<Price>("\"-3.00\"").is_err());
    }
}
