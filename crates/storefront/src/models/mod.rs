//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types.
//! Cart and order line lists are also the JSON documents persisted by the
//! store, so their serde names follow the shop's wire format
//! (`productos`, `cantidad`, ...).

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLimit, CartLine, MAX_LINE_QUANTITY};
pub use catalog::{Category, NewCategory, NewProduct, Product, ProductAttributes};
pub use order::{NewOrder, Order};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
