//! Helpers for end-to-end tests against a running storefront.
//!
//! The tests in `tests/` are `#[ignore]`d because they need a live server:
//!
//! ```bash
//! cargo run -p alpaca-storefront &
//! cargo test -p alpaca-integration-tests -- --ignored
//! ```
//!
//! Set `STOREFRONT_BASE_URL` to point them somewhere other than
//! `http://localhost:3000`. The server should run with
//! `STOREFRONT_PAYMENT_APPROVAL_RATE=1` so checkouts are approved.

use alpaca_core::UserId;
use reqwest::{Client, Response};
use serde::Deserialize;

/// Base URL of the storefront under test, without a trailing slash.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Build a client that keeps the session cookie between requests.
///
/// # Errors
///
/// Returns an error if the TLS backend can't be initialized.
pub fn session_client() -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).build()
}

/// A registered, logged-in shopper.
#[derive(Debug)]
pub struct Shopper {
    pub client: Client,
    pub base_url: String,
    pub user_id: UserId,
    pub email: String,
}

impl Shopper {
    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Register a fresh shopper and log them in.
///
/// Login redirects to `/carrito/{user}`; the user id is read back from the
/// final URL after the client follows the redirect.
///
/// # Errors
///
/// Returns an error if a request fails or the storefront rejects the
/// registration or login.
pub async fn register_and_login(email: &str) -> Result<Shopper, String> {
    let client = session_client().map_err(|e| e.to_string())?;
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/registro"))
        .form(&[
            ("nombre", "Prueba Integración"),
            ("email", email),
            ("direccion", "Jr. Puno 456, Arequipa"),
            ("telefono", "959123456"),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;
    expect_success(&resp, "registro")?;

    let resp = client
        .post(format!("{base_url}/login"))
        .form(&[("email", email)])
        .send()
        .await
        .map_err(|e| e.to_string())?;
    expect_success(&resp, "login")?;

    let user_id = resp
        .url()
        .path_segments()
        .and_then(Iterator::last)
        .and_then(|segment| segment.parse::<UserId>().ok())
        .ok_or_else(|| format!("login did not land on a cart page: {}", resp.url()))?;

    Ok(Shopper {
        client,
        base_url,
        user_id,
        email: email.to_string(),
    })
}

/// A unique email so repeated runs don't collide.
#[must_use]
pub fn unique_email() -> String {
    format!("prueba-{}@alpaca.test", uuid::Uuid::new_v4().simple())
}

fn expect_success(resp: &Response, step: &str) -> Result<(), String> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(format!("{step} failed with {}", resp.status()))
    }
}

/// A product as listed by `/api/productos`.
#[derive(Debug, Deserialize)]
pub struct ApiProduct {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: String,
}
