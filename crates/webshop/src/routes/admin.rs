//! Admin back office handlers.
//!
//! Every handler takes `RequireAdmin`, so anonymous visitors are sent to the
//! login page and logged-in customers get a 403.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use wtg_core::{Email, FileType, Login};

use crate::db::{
    ContentRepository, DiscountRepository, OrderRepository, ProductRepository, RepositoryError,
    UserRepository,
    users::{NewUser, UserChanges},
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, flash};
use crate::models::{User, content::EDITABLE_PAGES, content::is_editable};
use crate::services::{auth, discounts, import};
use crate::state::AppState;

use super::Layout;
use super::account::attachment;

const IMPORT_PATH: &str = "/admin/import";
const CONTENT_PATH: &str = "/admin/managecontent";
const USER_MANAGER_PATH: &str = "/admin/usermanager";

// =============================================================================
// Templates
// =============================================================================

/// Table sizes shown on the overview.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counts {
    pub users: i64,
    pub products: i64,
    pub discounts: i64,
    pub orders: i64,
}

/// Admin overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct OverviewTemplate {
    pub layout: Layout,
    pub counts: Counts,
}

/// Import page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/import.html")]
pub struct ImportTemplate {
    pub layout: Layout,
}

/// Content editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/managecontent.html")]
pub struct ManageContentTemplate {
    pub layout: Layout,
    pub pages: &'static [&'static str],
}

/// User manager template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/usermanager.html")]
pub struct UserManagerTemplate {
    pub layout: Layout,
}

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveContentForm {
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UserDataQuery {
    pub id: Option<String>,
}

/// Create or update form of the user manager.
#[derive(Debug, Deserialize)]
pub struct UpdateUserForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    /// Empty keeps the current password.
    #[serde(default)]
    pub password: String,
    /// Checkbox, present when ticked.
    pub is_admin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PricelistForm {
    #[serde(default)]
    pub login: String,
}

/// Body of the `getUserData` reply.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub login: String,
    pub company: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub favorites: usize,
}

impl From<&User> for UserDetails {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.to_string(),
            company: user.company.clone(),
            email: user.email.as_ref().map(ToString::to_string),
            is_admin: user.is_admin,
            favorites: user.favorites.len(),
        }
    }
}

// =============================================================================
// JSON replies
// =============================================================================

/// `{"message": ...}` with an optional payload.
#[must_use]
pub fn message(text: &str, payload: Option<Value>) -> Value {
    match payload {
        Some(payload) => json!({ "message": text, "payload": payload }),
        None => json!({ "message": text }),
    }
}

fn missing_parameter(name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(message(&format!("Missing request parameter: `{name}`"), None)),
    )
        .into_response()
}

// =============================================================================
// Overview
// =============================================================================

/// Display the admin overview.
pub async fn overview(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<OverviewTemplate, AppError> {
    let pool = state.pool();
    let counts = Counts {
        users: UserRepository::new(pool).count().await?,
        products: ProductRepository::new(pool).count().await?,
        discounts: DiscountRepository::new(pool).count().await?,
        orders: OrderRepository::new(pool).count().await?,
    };

    Ok(OverviewTemplate {
        layout: Layout::load(pool, &session, Some(admin)).await?,
        counts,
    })
}

// =============================================================================
// Import
// =============================================================================

/// Display the upload forms.
pub async fn import_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<ImportTemplate, AppError> {
    Ok(ImportTemplate {
        layout: Layout::load(state.pool(), &session, Some(admin)).await?,
    })
}

/// Read the `file` field of an upload form as text.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<String>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("upload read error: {e}")))?;
            if bytes.is_empty() {
                return Ok(None);
            }
            return Ok(Some(import::decode(&bytes)));
        }
    }
    Ok(None)
}

/// Replace the catalog with an uploaded product export.
#[instrument(skip_all, fields(admin = %admin.login))]
pub async fn product_import(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let Some(text) = read_upload(&mut multipart).await? else {
        flash::set_error(&session, "Geen bestand geselecteerd").await?;
        return Ok(Redirect::to(IMPORT_PATH));
    };

    match import::parse_products(&text) {
        Ok(products) => {
            let count = ProductRepository::new(state.pool())
                .replace_all(&products)
                .await?;
            tracing::info!(count, "Products imported");
            flash::set_status(&session, format!("{count} producten geïmporteerd")).await?;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product import rejected");
            flash::set_error(&session, e.to_string()).await?;
        }
    }

    Ok(Redirect::to(IMPORT_PATH))
}

/// Replace all discounts with an uploaded discount export.
#[instrument(skip_all, fields(admin = %admin.login))]
pub async fn discount_import(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let Some(text) = read_upload(&mut multipart).await? else {
        flash::set_error(&session, "Geen bestand geselecteerd").await?;
        return Ok(Redirect::to(IMPORT_PATH));
    };

    match import::parse_discounts(&text) {
        Ok(rows) => {
            let count = DiscountRepository::new(state.pool())
                .replace_all(&rows)
                .await?;
            tracing::info!(count, "Discounts imported");
            flash::set_status(&session, format!("{count} kortingen geïmporteerd")).await?;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Discount import rejected");
            flash::set_error(&session, e.to_string()).await?;
        }
    }

    Ok(Redirect::to(IMPORT_PATH))
}

// =============================================================================
// Content
// =============================================================================

/// Display the content editor.
pub async fn manage_content(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<ManageContentTemplate, AppError> {
    Ok(ManageContentTemplate {
        layout: Layout::load(state.pool(), &session, Some(admin)).await?,
        pages: EDITABLE_PAGES,
    })
}

/// Markdown of a content block, for the editor.
pub async fn get_content(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ContentQuery>,
) -> Result<Response, AppError> {
    let Some(page) = query.page.filter(|p| !p.is_empty()) else {
        return Ok(missing_parameter("page"));
    };
    if !is_editable(&page) {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(message(&format!("Unknown page: {page}"), None)),
        )
            .into_response());
    }

    let markdown = ContentRepository::new(state.pool())
        .get(&page)
        .await?
        .map(|block| block.markdown)
        .unwrap_or_default();

    Ok(Json(message(
        &format!("Content for page {page}"),
        Some(json!({ "page": page, "content": markdown })),
    ))
    .into_response())
}

/// Save a content block.
#[instrument(skip_all, fields(admin = %admin.login, page = %form.page))]
pub async fn save_content(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<SaveContentForm>,
) -> Result<Redirect, AppError> {
    if !is_editable(&form.page) {
        flash::set_error(&session, "Onbekende pagina").await?;
        return Ok(Redirect::to(CONTENT_PATH));
    }

    ContentRepository::new(state.pool())
        .save(&form.page, &form.content)
        .await?;
    tracing::info!("Content saved");

    flash::set_status(&session, "De wijzigingen zijn opgeslagen").await?;
    Ok(Redirect::to(CONTENT_PATH))
}

// =============================================================================
// Users
// =============================================================================

/// Display the user manager.
pub async fn user_manager(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<UserManagerTemplate, AppError> {
    Ok(UserManagerTemplate {
        layout: Layout::load(state.pool(), &session, Some(admin)).await?,
    })
}

/// User details by login, as JSON.
pub async fn get_user_data(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserDataQuery>,
) -> Result<Response, AppError> {
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return Ok(missing_parameter("id"));
    };

    let user = match Login::parse(&id) {
        Ok(login) => UserRepository::new(state.pool()).get_by_login(&login).await?,
        Err(_) => None,
    };

    let Some(user) = user else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(message(&format!("No user found with login {id}"), None)),
        )
            .into_response());
    };

    let payload = serde_json::to_value(UserDetails::from(&user))
        .map_err(|e| AppError::Internal(format!("user serialization failed: {e}")))?;

    Ok(Json(message(&format!("User details for user {id}"), Some(payload))).into_response())
}

/// Create a user, or update the one with this login.
#[instrument(skip_all, fields(admin = %admin.login, login = %form.login))]
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<UpdateUserForm>,
) -> Result<Redirect, AppError> {
    match save_user(&state, &form).await? {
        Ok(status) => flash::set_status(&session, status).await?,
        Err(errors) => flash::set_errors(&session, errors).await?,
    }
    Ok(Redirect::to(USER_MANAGER_PATH))
}

/// Validate the form and store it. The inner result carries the flash text.
async fn save_user(
    state: &AppState,
    form: &UpdateUserForm,
) -> Result<Result<String, Vec<String>>, AppError> {
    let mut errors = Vec::new();

    let login = match Login::parse(&form.login) {
        Ok(login) => Some(login),
        Err(_) => {
            errors.push("Het debiteurnummer is ongeldig".to_string());
            None
        }
    };
    let company = form.company.trim();
    if company.is_empty() {
        errors.push("De bedrijfsnaam is verplicht".to_string());
    }
    let email = match form.email.trim() {
        "" => None,
        raw => match Email::parse(raw) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.push("Het e-mailadres is ongeldig".to_string());
                None
            }
        },
    };
    if !form.password.is_empty() && auth::validate_password(&form.password).is_err() {
        errors.push(format!(
            "Het wachtwoord moet minimaal {} tekens bevatten",
            auth::MIN_PASSWORD_LENGTH
        ));
    }

    let Some(login) = login.filter(|_| errors.is_empty()) else {
        return Ok(Err(errors));
    };
    let password_hash = match form.password.as_str() {
        "" => None,
        password => Some(auth::hash_password(password)?),
    };

    let users = UserRepository::new(state.pool());
    let is_admin = form.is_admin.is_some();

    if users.get_by_login(&login).await?.is_some() {
        users
            .update(
                &login,
                &UserChanges {
                    company,
                    email: email.as_ref(),
                    password_hash: password_hash.as_deref(),
                    is_admin,
                },
            )
            .await?;
        tracing::info!("User updated");
        return Ok(Ok(format!("Gebruiker {login} is bijgewerkt")));
    }

    let Some(password_hash) = password_hash else {
        return Ok(Err(vec![
            "Een wachtwoord is verplicht voor een nieuwe gebruiker".to_string(),
        ]));
    };

    match users
        .create(&NewUser {
            login: &login,
            company,
            email: email.as_ref(),
            password_hash: &password_hash,
            is_admin,
        })
        .await
    {
        Ok(_) => {
            tracing::info!("User created");
            Ok(Ok(format!("Gebruiker {login} is aangemaakt")))
        }
        Err(RepositoryError::Conflict(_)) => Ok(Err(vec![format!(
            "Gebruiker {login} bestaat al"
        )])),
        Err(e) => Err(e.into()),
    }
}

/// Download the CSV discount file of any customer.
#[instrument(skip_all, fields(admin = %admin.login, login = %form.login))]
pub async fn pricelist(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<PricelistForm>,
) -> Result<Response, AppError> {
    let user = match Login::parse(&form.login) {
        Ok(login) => UserRepository::new(state.pool()).get_by_login(&login).await?,
        Err(_) => None,
    };
    let Some(user) = user else {
        flash::set_error(
            &session,
            format!("Geen gebruiker gevonden met debiteurnummer {}", form.login.trim()),
        )
        .await?;
        return Ok(Redirect::to(USER_MANAGER_PATH).into_response());
    };

    let file = discounts::build_file(
        state.pool(),
        &state.config().icc_gln,
        &user.login,
        &user.company,
        FileType::Csv,
        chrono::Local::now().date_naive(),
    )
    .await?;

    Ok(attachment(FileType::Csv, &file.file_name, file.content))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wtg_core::{Favorites, UserId};

    #[test]
    fn test_message_without_payload() {
        let value = message("Missing request parameter: `id`", None);
        assert_eq!(
            value.to_string(),
            r#"{"message":"Missing request parameter: `id`"}"#
        );
    }

    #[test]
    fn test_message_with_payload() {
        let user = User {
            id: UserId::new(1),
            login: Login::parse("13370").unwrap(),
            company: "Wiringa".to_string(),
            email: Some(Email::parse("info@example.com").unwrap()),
            is_admin: true,
            favorites: Favorites::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let payload = serde_json::to_value(UserDetails::from(&user)).unwrap();
        let value = message("User details for user 13370", Some(payload));

        assert_eq!(value["message"], "User details for user 13370");
        assert_eq!(value["payload"]["login"], "13370");
        assert_eq!(value["payload"]["company"], "Wiringa");
        assert_eq!(value["payload"]["email"], "info@example.com");
        assert_eq!(value["payload"]["is_admin"], true);
    }
}
