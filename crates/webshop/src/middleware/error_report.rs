//! Routing of error responses to Sentry and the maintainer's mailbox.
//!
//! `AppError` attaches an [`ErrorReport`] to every error response. This
//! middleware sets the Sentry user for the request and then:
//!
//! - mails server errors to the maintainer (production only) on a spawned
//!   task, so the response is never delayed;
//! - records client errors of logged-in users as Sentry warnings.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::{ErrorReport, Severity, set_sentry_user};
use crate::state::AppState;

use super::auth::OptionalAuth;

pub async fn report_errors(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request: Request,
    next: Next,
) -> Response {
    if let Some(user) = &user {
        set_sentry_user(&user.login, &user.company);
    }

    let request_line = format!("{} {}", request.method(), request.uri());
    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    match report.severity {
        Severity::Client => {
            if user.is_some() {
                sentry::capture_message(
                    &format!("{}: {}", report.kind, report.message),
                    sentry::Level::Warning,
                );
            }
        }
        Severity::Server => {
            if let Some(to) = state.config().error_mail_recipient() {
                let to = to.to_owned();
                let email = state.email().clone();
                let login = user.map(|u| u.login.to_string());

                tokio::spawn(async move {
                    if let Err(e) = email
                        .send_error_report(&to, &report, &request_line, login.as_deref())
                        .await
                    {
                        tracing::error!(error = %e, "Failed to send error report");
                    }
                });
            }
        }
    }

    response
}
