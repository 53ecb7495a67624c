//! Checkout route handlers.
//!
//! Checkout works on the logged-in user's cart. A declined payment renders
//! the result page like an approved one; only invalid input is an error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use alpaca_core::PaymentMethod;

use crate::error::{Result, add_breadcrumb};
use crate::extract::Form;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Cart, CurrentUser, Order};
use crate::services::{CheckoutRequest, Missing, ServiceError};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub address: String,
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub paypal_email: Option<String>,
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub user: Option<CurrentUser>,
    pub cart: Cart,
    pub address: String,
    pub error: Option<String>,
}

/// Payment result template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout_result.html")]
pub struct CheckoutResultTemplate {
    pub user: Option<CurrentUser>,
    pub approved: bool,
    pub total: Decimal,
    pub order: Option<Order>,
}

/// Display the checkout form, prefilled with the user's address.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<CheckoutTemplate> {
    let cart = state.carts().get_or_create_cart(user.id).await?;
    let address = state
        .repos()
        .users
        .get_user(user.id)
        .await?
        .ok_or(ServiceError::NotFound(Missing::User))?
        .address;

    Ok(CheckoutTemplate {
        user: Some(user),
        cart,
        address,
        error: None,
    })
}

/// Run the simulated payment and render the outcome.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Ok(payment_method) = form.payment_method.parse::<PaymentMethod>() else {
        return rerender(&state, user, form, "Selecciona un método de pago".to_string()).await;
    };

    let request = CheckoutRequest {
        payment_method,
        address: form.address.clone(),
        card_number: form.card_number.clone(),
        card_holder: form.card_holder.clone(),
        paypal_email: form.paypal_email.clone(),
    };

    let outcome = match state.checkout().checkout(user.id, &request).await {
        Ok(outcome) => outcome,
        Err(ServiceError::InvalidState(message)) => {
            return rerender(&state, user, form, message).await;
        }
        Err(e) => return Err(e.into()),
    };

    add_breadcrumb(
        "checkout",
        "Payment simulated",
        &[
            ("estado_pago", outcome.status.to_string()),
            ("total", outcome.total.to_string()),
        ],
    );

    Ok(CheckoutResultTemplate {
        user: Some(user),
        approved: outcome.approved(),
        total: outcome.total,
        order: outcome.order,
    }
    .into_response())
}

/// Show the form again with the shopper's input and an error.
async fn rerender(
    state: &AppState,
    user: CurrentUser,
    form: CheckoutForm,
    error: String,
) -> Result<Response> {
    let cart = state.carts().get_or_create_cart(user.id).await?;

    Ok((
        StatusCode::BAD_REQUEST,
        CheckoutTemplate {
            user: Some(user),
            cart,
            address: form.address,
            error: Some(error),
        },
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};

    use crate::routes::test_support::{Harness, body_text, form_request, get, harness};
    use crate::services::FixedOutcome;
    use alpaca_core::PaymentStatus;

    const CARD_FORM: &str = "payment_method=tarjeta&address=Av.+El+Sol+123&card_number=4242424242424242&card_holder=Rosa";

    async fn with_cart(status: PaymentStatus) -> (Harness, String) {
        let h = harness(FixedOutcome(status)).await;
        let cookie = h.login().await;
        h.state
            .carts()
            .add_item(h.fx.user.id, h.fx.scarf.id, 2)
            .await
            .unwrap();
        (h, cookie)
    }

    fn with_cookie(
        mut request: axum::http::Request<axum::body::Body>,
        cookie: &str,
    ) -> axum::http::Request<axum::body::Body> {
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        request
    }

    #[tokio::test]
    async fn test_checkout_requires_login() {
        let h = harness(FixedOutcome(PaymentStatus::Approved)).await;
        let response = h.send(get("/checkout")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_checkout_page_prefills_address() {
        let (h, cookie) = with_cart(PaymentStatus::Approved).await;
        let response = h.send(with_cookie(get("/checkout"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Av. El Sol 123, Cusco"));
        assert!(html.contains("Bufanda Inti"));
    }

    #[tokio::test]
    async fn test_approved_checkout_renders_success() {
        let (h, cookie) = with_cart(PaymentStatus::Approved).await;
        let response = h
            .send(with_cookie(
                form_request("POST", "/checkout", CARD_FORM),
                &cookie,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Pago aprobado"));
        assert!(html.contains("131.00"));

        let cart = h
            .state
            .repos()
            .carts
            .get_cart_by_user(h.fx.user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(cart.is_empty());
        let orders = h
            .state
            .repos()
            .orders
            .orders_for_user(h.fx.user.id)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_declined_checkout_renders_failure() {
        let (h, cookie) = with_cart(PaymentStatus::Declined).await;
        let response = h
            .send(with_cookie(
                form_request("POST", "/checkout", CARD_FORM),
                &cookie,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Pago rechazado"));

        let cart = h
            .state
            .repos()
            .carts
            .get_cart_by_user(h.fx.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_rerender_form() {
        let (h, cookie) = with_cart(PaymentStatus::Approved).await;

        let response = h
            .send(with_cookie(
                form_request("POST", "/checkout", "payment_method=paypal&address=Cusco"),
                &cookie,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("El correo de PayPal es obligatorio"));

        let response = h
            .send(with_cookie(
                form_request("POST", "/checkout", "payment_method=bitcoin&address=Cusco"),
                &cookie,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Selecciona un método de pago"));
    }
}
