//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`cart`] - Cart engine: create, add, remove, clear, total recomputation
//! - [`checkout`] - Checkout simulator: payment outcome and order snapshot
//! - [`users`] - Registration and email login
//!
//! Services borrow the repositories from [`crate::db::Repositories`] and are
//! cheap to build per request.

pub mod cart;
pub mod checkout;
mod error;
pub mod users;

pub use cart::CartService;
pub use checkout::{
    CheckoutOutcome, CheckoutRequest, CheckoutService, FixedOutcome, PaymentSimulator,
    RandomApproval,
};
pub use error::{Missing, ServiceError};
pub use users::{Registration, UserService};
