//! One-shot messages carried over a redirect.

use tower_sessions::Session;

use crate::models::{FlashMessage, session_keys};

/// Queue a confirmation for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_status(
    session: &Session,
    status: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flash = peek(session).await;
    flash.status = Some(status.into());
    session.insert(session_keys::FLASH, flash).await
}

/// Queue error lines for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_errors(
    session: &Session,
    errors: Vec<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flash = peek(session).await;
    flash.errors.extend(errors);
    session.insert(session_keys::FLASH, flash).await
}

/// Queue a single error line.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_error(
    session: &Session,
    error: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    set_errors(session, vec![error.into()]).await
}

/// Remove and return the pending message.
pub async fn take(session: &Session) -> FlashMessage {
    session
        .remove::<FlashMessage>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn peek(session: &Session) -> FlashMessage {
    session
        .get::<FlashMessage>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
