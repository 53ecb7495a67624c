//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Errors render as a JSON body
//! `{"mensaje": "..."}`; server errors are captured to Sentry first and their
//! details are never sent to the client.

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{Missing, ServiceError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found. Carries the message shown to the client.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client. Carries the message shown to the client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The message sent to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => Self::NotFound(
                match what {
                    Missing::User => "Usuario no encontrado",
                    Missing::Product => "Producto no encontrado",
                    Missing::Cart => "El carrito no existe",
                }
                .to_string(),
            ),
            ServiceError::InvalidState(msg) => Self::BadRequest(msg),
            ServiceError::InvalidPrice(_) => {
                Self::BadRequest("Producto sin precio disponible".to_string())
            }
            ServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected form body");
        Self::BadRequest("El formulario tiene campos faltantes o no válidos".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected JSON body");
        Self::BadRequest("El cuerpo JSON tiene campos faltantes o no válidos".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path");
        Self::BadRequest("La ruta contiene un identificador no válido".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(json!({ "mensaje": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after login to associate errors with the shopper.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action, e.g. `("cart", "Item added", [("producto_id", "3")])`.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alpaca_core::ProductId;
    use axum::body::to_bytes;

    use super::*;

    async fn body_message(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json["mensaje"].as_str().unwrap().to_string())
    }

    #[test]
    fn test_service_error_status_codes() {
        let status = |e: ServiceError| AppError::from(e).status();

        assert_eq!(
            status(ServiceError::NotFound(Missing::Product)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ServiceError::InvalidState("El carrito ya existe".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ServiceError::InvalidPrice(ProductId::new(3))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ServiceError::Repository(RepositoryError::DataCorruption(
                "bad lines".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_uses_mensaje() {
        let (status, msg) =
            body_message(ServiceError::NotFound(Missing::Product).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(msg, "Producto no encontrado");

        let (_, msg) = body_message(ServiceError::InvalidPrice(ProductId::new(9)).into()).await;
        assert_eq!(msg, "Producto sin precio disponible");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, msg) = body_message(AppError::Database(RepositoryError::DataCorruption(
            "lines column is not an array".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("lines column"));
    }
}
