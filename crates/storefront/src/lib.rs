//! Tienda Alpaca storefront library.
//!
//! The cart engine, checkout simulator, persistence and web layer, kept in a
//! library so the binary, the CLI and the tests share them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;
