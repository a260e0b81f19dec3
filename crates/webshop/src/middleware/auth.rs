//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in customer or an admin in
//! route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

use super::ajax::is_ajax;

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires authentication.
///
/// If the user is not logged in, returns a redirect to the login page, or
/// 401 Unauthorized for ajax requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hallo {}!", user.company)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for ajax requests).
    Unauthorized,
    /// Logged in, but not an administrator.
    Forbidden,
    /// The account could not be loaded.
    Database(RepositoryError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Geen toegang!").into_response(),
            Self::Database(e) => AppError::Database(e).into_response(),
        }
    }
}

async fn current_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| {
            if is_ajax(&parts.headers) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).await.map(Self)
    }
}

/// Extractor that requires an administrator.
///
/// Redirects to login when nobody is logged in and answers 403 Forbidden
/// to customers without the admin flag. The flag is read from the database
/// on every request, so a demoted account loses access at once.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_user = current_user(parts).await?;
        let stored = UserRepository::new(state.pool())
            .get_by_id(session_user.id)
            .await
            .map_err(AuthRejection::Database)?;

        check_admin(&session_user, stored.as_ref(), parts.uri.path()).map(Self)
    }
}

/// Decide admin access from the stored account, not the session snapshot.
fn check_admin(
    session_user: &CurrentUser,
    stored: Option<&User>,
    path: &str,
) -> Result<CurrentUser, AuthRejection> {
    let Some(user) = stored else {
        tracing::warn!(login = %session_user.login, "Session refers to a removed account");
        return Err(AuthRejection::RedirectToLogin);
    };

    if !user.is_admin {
        tracing::warn!(login = %user.login, path, "Non-admin tried to access admin page");
        return Err(AuthRejection::Forbidden);
    }

    Ok(CurrentUser::from(user))
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user and the cart from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<crate::models::Cart>(session_keys::CART)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wtg_core::{Favorites, Login, UserId};

    fn stored(is_admin: bool) -> User {
        User {
            id: UserId::new(7),
            login: Login::parse("10000").unwrap(),
            company: "Wiringa".to_string(),
            email: None,
            is_admin,
            favorites: Favorites::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn admin_snapshot() -> CurrentUser {
        CurrentUser::from(&stored(true))
    }

    #[test]
    fn test_demoted_admin_is_forbidden() {
        let result = check_admin(&admin_snapshot(), Some(&stored(false)), "/admin");
        assert!(matches!(result, Err(AuthRejection::Forbidden)));
    }

    #[test]
    fn test_removed_account_goes_to_login() {
        let result = check_admin(&admin_snapshot(), None, "/admin");
        assert!(matches!(result, Err(AuthRejection::RedirectToLogin)));
    }

    #[test]
    fn test_promoted_customer_is_admitted() {
        let mut snapshot = admin_snapshot();
        snapshot.is_admin = false;

        let admin = check_admin(&snapshot, Some(&stored(true)), "/admin").unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.login.as_str(), "10000");
    }

    #[test]
    fn test_forbidden_response() {
        let response = AuthRejection::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
