//! Content pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::content;
use crate::state::AppState;

use super::Layout;

/// A page that shows one content block.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub html: String,
}

async fn content_page(
    state: &AppState,
    session: &Session,
    user: Option<crate::models::CurrentUser>,
    name: &str,
    title: &'static str,
) -> Result<ContentPageTemplate, AppError> {
    let layout = Layout::load(state.pool(), session, user).await?;
    let html = content::rendered(state.pool(), name).await?;

    Ok(ContentPageTemplate {
        layout,
        title,
        html,
    })
}

/// Display the home page.
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ContentPageTemplate, AppError> {
    content_page(&state, &session, user, "home", "Home").await
}

/// Display the company page.
pub async fn about(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ContentPageTemplate, AppError> {
    content_page(&state, &session, user, "about", "Het bedrijf").await
}

/// Display the contact page.
pub async fn contact(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ContentPageTemplate, AppError> {
    content_page(&state, &session, user, "contact", "Contact").await
}
