//! Registration and login.
//!
//! Login is by email only; there are no passwords.

use tracing::{info, instrument};

use alpaca_core::Email;

use super::{CartService, Missing, ServiceError};
use crate::db::{Repositories, RepositoryError, UserDirectory};
use crate::models::{NewUser, User};

const USER_EXISTS: &str = "El usuario ya existe";

/// Fields of the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// User operations for a single request.
pub struct UserService<'a> {
    users: &'a dyn UserDirectory,
    carts: CartService<'a>,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            users: repos.users.as_ref(),
            carts: CartService::new(repos),
        }
    }

    /// Register a new shopper.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` if a field is blank, the email is
    /// malformed, or the email is already registered.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<User, ServiceError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid_state("El nombre es obligatorio"));
        }
        let email = Email::parse(&form.email)
            .map_err(|_| ServiceError::invalid_state("El correo no es válido"))?;

        let new_user = NewUser {
            name: name.to_owned(),
            email,
            address: form.address.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
        };

        let user = self
            .users
            .create_user(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::invalid_state(USER_EXISTS),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Log a shopper in by email and make sure they have a cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no user has this email.
    #[instrument(skip(self))]
    pub async fn login(&self, email: &str) -> Result<User, ServiceError> {
        let email = Email::parse(email).map_err(|_| ServiceError::NotFound(Missing::User))?;

        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or(ServiceError::NotFound(Missing::User))?;

        let cart = self.carts.get_or_create_cart(user.id).await?;
        info!(user_id = %user.id, cart_id = %cart.id, "User logged in");

        Ok(User {
            cart_id: Some(cart.id),
            ..user
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::fixture;

    fn registration(email: &str) -> Registration {
        Registration {
            name: " Lucho Quispe ".to_owned(),
            email: email.to_owned(),
            address: "Calle Plateros 7, Cusco".to_owned(),
            phone: "984222333".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_fields() {
        let fx = fixture().await;
        let user = UserService::new(&fx.repos)
            .register(&registration("Lucho@Alpaca.PE"))
            .await
            .unwrap();

        assert_eq!(user.name, "Lucho Quispe");
        assert_eq!(user.email.as_str(), "lucho@alpaca.pe");
        assert_eq!(user.cart_id, None);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let fx = fixture().await;
        let err = UserService::new(&fx.repos)
            .register(&registration("ROSA@alpaca.pe"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(ref m) if m == USER_EXISTS));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let fx = fixture().await;
        let err = UserService::new(&fx.repos)
            .register(&registration("no-at-sign"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_login_creates_cart() {
        let fx = fixture().await;
        let user = UserService::new(&fx.repos)
            .login("rosa@alpaca.pe")
            .await
            .unwrap();

        let cart = fx
            .repos
            .carts
            .get_cart_by_user(user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.cart_id, Some(cart.id));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let fx = fixture().await;
        let service = UserService::new(&fx.repos);
        assert!(matches!(
            service.login("nadie@alpaca.pe").await,
            Err(ServiceError::NotFound(Missing::User))
        ));
        assert!(matches!(
            service.login("").await,
            Err(ServiceError::NotFound(Missing::User))
        ));
    }
}
