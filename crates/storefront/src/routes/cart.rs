//! Cart route handlers.
//!
//! Carts are addressed by user id in the path. The JSON endpoints answer
//! with the cart document or a `{"mensaje": ...}` body; the form endpoints
//! redirect back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use alpaca_core::{ProductId, UserId};

use super::{wants_html, wants_json};
use crate::error::{Result, add_breadcrumb};
use crate::extract::{Form, JsonBody, Path};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Cart, CurrentUser};
use crate::state::AppState;

/// `{"mensaje": ..., "carrito": ...}` response body.
#[derive(Debug, Serialize)]
pub struct CartMessage {
    pub mensaje: &'static str,
    pub carrito: Cart,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub producto_id: ProductId,
    #[serde(default = "one")]
    pub cantidad: u32,
}

const fn one() -> u32 {
    1
}

/// Remove item body (JSON or form).
#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    pub producto_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "carrito.html")]
pub struct CartTemplate {
    pub user: Option<CurrentUser>,
    pub owner: UserId,
    pub cart: Cart,
}

fn cart_location(user_id: UserId) -> String {
    format!("/carrito/{user_id}")
}

/// Create an empty cart for a user.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<(StatusCode, Json<CartMessage>)> {
    let cart = state.carts().create_cart(user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CartMessage {
            mensaje: "Carrito creado exitosamente",
            carrito: cart,
        }),
    ))
}

/// Show a user's cart: JSON by default, the cart page for browsers.
#[instrument(skip(state, headers, viewer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(user_id): Path<UserId>,
    headers: HeaderMap,
) -> Result<Response> {
    let cart = state.carts().get_or_create_cart(user_id).await?;

    if wants_html(&headers) {
        return Ok(CartTemplate {
            user: viewer,
            owner: user_id,
            cart,
        }
        .into_response());
    }
    Ok(Json(cart).into_response())
}

/// Add an item from the product page form.
#[instrument(skip(state, headers))]
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    headers: HeaderMap,
    Form(form): Form<AddItemForm>,
) -> Result<Response> {
    let cart = state
        .carts()
        .add_item(user_id, form.producto_id, form.cantidad)
        .await?;
    add_breadcrumb(
        "cart",
        "Item added",
        &[
            ("producto_id", form.producto_id.to_string()),
            ("cantidad", form.cantidad.to_string()),
        ],
    );

    if wants_json(&headers) {
        return Ok(Json(cart).into_response());
    }
    Ok(Redirect::to(&cart_location(user_id)).into_response())
}

/// Remove an item (JSON body).
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    JsonBody(body): JsonBody<RemoveItem>,
) -> Result<Json<CartMessage>> {
    let cart = state.carts().remove_item(user_id, body.producto_id).await?;
    Ok(Json(CartMessage {
        mensaje: "Producto eliminado del carrito",
        carrito: cart,
    }))
}

/// Remove an item from the cart page form.
#[instrument(skip(state))]
pub async fn remove_form(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Form(body): Form<RemoveItem>,
) -> Result<Redirect> {
    state.carts().remove_item(user_id, body.producto_id).await?;
    Ok(Redirect::to(&cart_location(user_id)))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<CartMessage>> {
    let cart = state.carts().clear_cart(user_id).await?;
    Ok(Json(CartMessage {
        mensaje: "Carrito vaciado",
        carrito: cart,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};
    use serde_json::json;

    use crate::routes::test_support::{
        Harness, body_json, body_text, form_request, get, harness, json_request,
    };
    use crate::services::FixedOutcome;
    use alpaca_core::PaymentStatus;

    async fn approved() -> Harness {
        harness(FixedOutcome(PaymentStatus::Approved)).await
    }

    fn add_body(product: impl std::fmt::Display, qty: u32) -> String {
        format!("producto_id={product}&cantidad={qty}")
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let h = approved().await;
        let uri = format!("/carrito/{}/crear", h.fx.user.id);

        let response = h.send(form_request("POST", &uri, "")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["mensaje"], "Carrito creado exitosamente");
        assert_eq!(json["carrito"]["total"], "0");

        let response = h.send(form_request("POST", &uri, "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["mensaje"], "El carrito ya existe");
    }

    #[tokio::test]
    async fn test_create_for_unknown_user() {
        let h = approved().await;
        let response = h.send(form_request("POST", "/carrito/999/crear", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["mensaje"], "Usuario no encontrado");
    }

    #[tokio::test]
    async fn test_add_redirects_and_merges() {
        let h = approved().await;
        let uri = format!("/carrito/{}/agregar", h.fx.user.id);

        let response = h
            .send(form_request("POST", &uri, &add_body(h.fx.scarf.id, 2)))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("/carrito/{}", h.fx.user.id).as_str()
        );

        h.send(form_request("POST", &uri, &add_body(h.fx.scarf.id, 1)))
            .await;

        let cart = body_json(h.send(get(&format!("/carrito/{}", h.fx.user.id))).await).await;
        let lines = cart["productos"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["cantidad"], 3);
        assert_eq!(cart["total"], "196.50");
    }

    #[tokio::test]
    async fn test_add_with_json_accept() {
        let h = approved().await;
        let mut request = form_request(
            "POST",
            &format!("/carrito/{}/agregar", h.fx.user.id),
            &add_body(h.fx.sweater.id, 1),
        );
        request
            .headers_mut()
            .insert(header::ACCEPT, "application/json".parse().unwrap());

        let response = h.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["total"], "189.90");
    }

    async fn assert_json_bad_request(response: axum::response::Response) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = body_json(response).await;
        assert!(!json["mensaje"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_requests_answer_with_mensaje() {
        let h = approved().await;
        let user = h.fx.user.id;

        // Missing producto_id
        let response = h
            .send(form_request("POST", &format!("/carrito/{user}/agregar"), "cantidad=2"))
            .await;
        assert_json_bad_request(response).await;

        let response = h
            .send(form_request(
                "POST",
                &format!("/carrito/{user}/agregar"),
                &format!("producto_id={}&cantidad=-1", h.fx.scarf.id),
            ))
            .await;
        assert_json_bad_request(response).await;

        assert_json_bad_request(h.send(get("/carrito/abc")).await).await;

        let response = h
            .send(json_request("DELETE", &format!("/carrito/{user}/quitar"), &json!({})))
            .await;
        assert_json_bad_request(response).await;
    }

    #[tokio::test]
    async fn test_add_past_quantity_limit() {
        let h = approved().await;
        let uri = format!("/carrito/{}/agregar", h.fx.user.id);

        let response = h
            .send(form_request("POST", &uri, &add_body(h.fx.scarf.id, 4_294_967_295)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["mensaje"],
            "La cantidad excede el máximo"
        );

        let cart = body_json(h.send(get(&format!("/carrito/{}", h.fx.user.id))).await).await;
        assert_eq!(cart["productos"], json!([]));
    }

    #[tokio::test]
    async fn test_add_errors() {
        let h = approved().await;
        let uri = format!("/carrito/{}/agregar", h.fx.user.id);

        let response = h.send(form_request("POST", &uri, &add_body(404, 1))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["mensaje"], "Producto no encontrado");

        let response = h
            .send(form_request("POST", &uri, &add_body(h.fx.unpriced.id, 1)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["mensaje"],
            "Producto sin precio disponible"
        );

        let response = h
            .send(form_request("POST", &uri, &add_body(h.fx.scarf.id, 0)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let h = approved().await;
        let base = format!("/carrito/{}", h.fx.user.id);
        h.send(form_request(
            "POST",
            &format!("{base}/agregar"),
            &add_body(h.fx.scarf.id, 1),
        ))
        .await;
        h.send(form_request(
            "POST",
            &format!("{base}/agregar"),
            &add_body(h.fx.sweater.id, 1),
        ))
        .await;

        let response = h
            .send(json_request(
                "DELETE",
                &format!("{base}/quitar"),
                &json!({ "producto_id": h.fx.scarf.id }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["mensaje"], "Producto eliminado del carrito");
        assert_eq!(json["carrito"]["total"], "189.90");

        let response = h
            .send(json_request("DELETE", &format!("{base}/vaciar"), &json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["mensaje"], "Carrito vaciado");
        assert!(json["carrito"]["productos"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_form_redirects() {
        let h = approved().await;
        let response = h
            .send(form_request(
                "POST",
                &format!("/carrito/{}/quitar", h.fx.user.id),
                &format!("producto_id={}", h.fx.scarf.id),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_show_html_for_browsers() {
        let h = approved().await;
        let mut request = get(&format!("/carrito/{}", h.fx.user.id));
        request.headers_mut().insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml".parse().unwrap(),
        );

        let response = h.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Tu carrito"));
    }
}
