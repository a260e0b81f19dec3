//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response carries an [`ErrorReport`] extension. The
//! `report_errors` middleware picks it up to mail server errors to the
//! maintainer and to record client errors of logged-in users.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use wtg_core::ExportError;

use crate::db::RepositoryError;
use crate::services::{AuthError, EmailError, ImportError};

/// Application-level error type for the webshop.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Sending mail failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Unknown discount file type or delivery method.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Malformed admin upload.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Whether an error is the server's fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Server,
    Client,
}

/// What an error response tells the reporting middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Variant name, e.g. `Database`.
    pub kind: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl AppError {
    /// The HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_)
            | Self::Email(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::UserNotFound
                | AuthError::InvalidLogin(_) => StatusCode::UNAUTHORIZED,
                AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Export(_) | Self::Import(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "Database",
            Self::Auth(_) => "Auth",
            Self::Email(_) => "Email",
            Self::Export(_) => "Export",
            Self::Import(_) => "Import",
            Self::Session(_) => "Session",
            Self::NotFound(_) => "NotFound",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::BadRequest(_) => "BadRequest",
            Self::Internal(_) => "Internal",
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        if self.status().is_server_error() {
            Severity::Server
        } else {
            Severity::Client
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let severity = self.severity();

        // Capture server errors to Sentry
        if severity == Severity::Server {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if severity == Severity::Server => "Internal server error".to_string(),
            Self::Export(err) => err.to_string(),
            Self::Auth(_) => "Ongeldige inloggegevens".to_string(),
            _ => self.to_string(),
        };

        let report = ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            severity,
        };

        let mut response = (status, message).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the logged-in debtor.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(login: &impl ToString, company: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(login.to_string()),
            username: Some(company.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product", "1234567")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::Export(ExportError::UnknownType("pdf".to_string()));
        assert_eq!(err.to_string(), "Ongeldig bestands type");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Export(ExportError::UnknownDelivery(
                "fax".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_carries_report() {
        let response = AppError::Internal("disk full".to_string()).into_response();
        let report = response.extensions().get::<ErrorReport>();

        assert!(report.is_some_and(|r| r.kind == "Internal"
            && r.message.contains("disk full")
            && r.severity == Severity::Server));
    }

    #[test]
    fn test_client_errors_are_not_server_severity() {
        assert_eq!(
            AppError::NotFound("x".to_string()).severity(),
            Severity::Client
        );
        assert_eq!(
            AppError::BadRequest("x".to_string()).severity(),
            Severity::Client
        );
        assert_eq!(
            AppError::Unauthorized("x".to_string()).severity(),
            Severity::Client
        );
    }
}
