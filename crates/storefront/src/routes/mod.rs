//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                          - Cart redirect when logged in, else category index
//! GET    /productos/{categoria_id}  - Products in a category
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check
//!
//! # Users
//! GET    /registro                  - Registration form
//! POST   /registro                  - Register, redirect to /login
//! GET    /login                     - Login form
//! POST   /login                     - Log in by email, redirect to cart
//! POST   /logout                    - Log out
//!
//! # Cart
//! POST   /carrito/{user}/crear      - Create cart (201, 400 if it exists)
//! GET    /carrito/{user}            - Cart as JSON, or HTML page for browsers
//! POST   /carrito/{user}/agregar    - Add item (form), redirect to cart
//! DELETE /carrito/{user}/quitar     - Remove item (JSON body)
//! POST   /carrito/{user}/quitar     - Remove item (form), redirect to cart
//! DELETE /carrito/{user}/vaciar     - Empty cart
//!
//! # Checkout (requires login)
//! GET    /checkout                  - Checkout form
//! POST   /checkout                  - Simulated payment, result page
//! GET    /pedidos/{user}            - Order history (JSON)
//!
//! # Catalog API
//! GET    /api/categorias            - Categories
//! GET    /api/productos             - Products
//! GET    /api/productos/{id}        - Product
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod home;
pub mod orders;

use axum::{
    Router,
    http::HeaderMap,
    http::header::ACCEPT,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/carrito/{user}", get(cart::show))
        .route("/carrito/{user}/crear", post(cart::create))
        .route("/carrito/{user}/agregar", post(cart::add))
        .route(
            "/carrito/{user}/quitar",
            delete(cart::remove).post(cart::remove_form),
        )
        .route("/carrito/{user}/vaciar", delete(cart::clear))
}

/// Create the catalog API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/categorias", get(catalog::api_categories))
        .route("/productos", get(catalog::api_products))
        .route("/productos/{id}", get(catalog::api_product))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/productos/{categoria_id}", get(catalog::products_page))
        // Users
        .route("/registro", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        // Cart
        .merge(cart_routes())
        // Checkout and orders
        .route("/checkout", get(checkout::page).post(checkout::submit))
        .route("/pedidos/{user}", get(orders::list))
        // JSON catalog
        .nest("/api", api_routes())
}

/// Whether the client asked for an HTML page.
pub(crate) fn wants_html(headers: &HeaderMap) -> bool {
    accepts(headers, "text/html")
}

/// Whether the client asked for JSON.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    accepts(headers, "application/json")
}

fn accepts(headers: &HeaderMap, mime: &str) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(mime))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    //! Router harness over the in-memory fixture.

    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, Response, header},
    };
    use tower::ServiceExt;

    use crate::config::StorefrontConfig;
    use crate::middleware::memory_session_layer;
    use crate::services::{FixedOutcome, PaymentSimulator};
    use crate::state::AppState;
    use crate::testing::{Fixture, fixture};

    pub struct Harness {
        pub app: Router,
        pub state: AppState,
        pub fx: Fixture,
    }

    pub async fn harness(payments: FixedOutcome) -> Harness {
        let fx = fixture().await;
        let config = StorefrontConfig::from_lookup(|_| None).unwrap();
        let payments: Arc<dyn PaymentSimulator> = Arc::new(payments);
        let state = AppState::new(config.clone(), fx.repos.clone(), payments, None);
        let app = super::routes()
            .with_state(state.clone())
            .layer(memory_session_layer(&config));
        Harness { app, state, fx }
    }

    impl Harness {
        pub async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.app.clone().oneshot(request).await.unwrap()
        }

        /// Log the fixture user in and return the session cookie.
        pub async fn login(&self) -> String {
            let response = self
                .send(form_request("POST", "/login", "email=rosa%40alpaca.pe"))
                .await;
            let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
            cookie.split(';').next().unwrap().to_string()
        }
    }

    pub fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
