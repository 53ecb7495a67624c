//! Extractors that reject with the shop's JSON error body.
//!
//! Same shape as axum's `Form`, `Json` and `Path`, but a body or path segment
//! that fails to parse becomes [`AppError::BadRequest`] with a `mensaje`
//! instead of axum's plain-text rejection.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// URL-encoded form body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct Form<T>(pub T);

/// JSON request body. Responses still use `axum::Json`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Typed path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);
