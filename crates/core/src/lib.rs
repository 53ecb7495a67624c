//! Alpaca Core - Shared types library.
//!
//! This crate provides common types used across the Alpaca store components:
//! - `storefront` - Public-facing shop with the cart engine and checkout
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and payment enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
