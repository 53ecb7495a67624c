//! Registration and login route handlers.
//!
//! Login is by email only. Form failures re-render the form with the error
//! and the submitted values.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::extract::Form;
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::Registration;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub telefono: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "registro.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub form: RegisterForm,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub email: String,
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    RegisterTemplate {
        user,
        error: None,
        form: RegisterForm::default(),
    }
}

/// Handle registration form submission, then send the shopper to log in.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let registration = Registration {
        name: form.nombre.clone(),
        email: form.email.clone(),
        address: form.direccion.clone(),
        phone: form.telefono.clone(),
    };

    match state.users().register(&registration).await {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(e) => {
            let e = AppError::from(e);
            tracing::warn!(error = %e, "Registration failed");
            (
                e.status(),
                RegisterTemplate {
                    user: None,
                    error: Some(e.public_message()),
                    form,
                },
            )
                .into_response()
        }
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        user,
        error: None,
        email: String::new(),
    }
}

/// Log in by email and redirect to the shopper's cart.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match state.users().login(&form.email).await {
        Ok(user) => user,
        Err(e) => {
            let e = AppError::from(e);
            tracing::warn!(error = %e, "Login failed");
            return (
                e.status(),
                LoginTemplate {
                    user: None,
                    error: Some(e.public_message()),
                    email: form.email,
                },
            )
                .into_response();
        }
    };

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        return AppError::Internal(format!("failed to store session: {e}")).into_response();
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Redirect::to(&format!("/carrito/{}", user.id)).into_response()
}

/// Log out and return to the home page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        return AppError::Internal(format!("failed to clear session: {e}")).into_response();
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}
