//! Authentication route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, flash, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

use super::Layout;

/// Shown for any failed login.
const LOGIN_FAILED: &str = "Gebruikersnaam en/of wachtwoord onjuist";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
}

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/account").into_response());
    }

    let layout = Layout::load(state.pool(), &session, None).await?;
    Ok(LoginTemplate {
        layout,
        username: String::new(),
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    match auth.login(form.username.trim(), &form.password).await {
        Ok(user) => {
            session.cycle_id().await?;

            let current = CurrentUser::from(&user);
            set_current_user(&session, &current).await?;
            set_sentry_user(&current.login, &current.company);
            add_breadcrumb("auth", "Logged in", Some(&[("login", current.login.as_str())]));
            tracing::info!(login = %current.login, "User logged in");

            Ok(Redirect::to("/account").into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidLogin(_)) => {
            tracing::info!("Login failed");
            flash::set_error(&session, LOGIN_FAILED).await?;

            let layout = Layout::load(state.pool(), &session, None).await?;
            Ok(LoginTemplate {
                layout,
                username: form.username,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and return to the home page.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}
