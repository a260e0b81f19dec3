//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wtg_core::{AddressId, Delivery, FileType, ProductNumber, Toggle};

use crate::db::{
    AddressRepository, OrderRepository, ProductRepository, RepositoryError, UserRepository,
};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{Ajax, RequireAuth, flash};
use crate::models::{Address, AddressForm, CurrentUser, OrderLine, User};
use crate::services::auth::PasswordChange;
use crate::services::{AuthService, discounts};
use crate::state::AppState;

use super::Layout;
use super::catalog::ProductView;

/// Orders per page in the order history.
pub const ORDERS_PER_PAGE: u32 = 15;

const DISCOUNT_FILE_PATH: &str = "/account/discountfile";
const ADDRESS_LIST_PATH: &str = "/account/addresslist";

// =============================================================================
// Templates
// =============================================================================

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub login: String,
    pub company: String,
    pub email: Option<String>,
    pub order_count: i64,
}

/// Change password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/changepassword.html")]
pub struct ChangePasswordTemplate {
    pub layout: Layout,
}

/// Products of one series on the favorites page.
pub struct SeriesGroup {
    pub series: String,
    pub products: Vec<ProductView>,
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/favorites.html")]
pub struct FavoritesTemplate {
    pub layout: Layout,
    pub groups: Vec<SeriesGroup>,
}

/// Order display data for templates.
pub struct OrderView {
    pub id: String,
    pub date: String,
    pub lines: Vec<OrderLine>,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orderhistory.html")]
pub struct OrderHistoryTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub page: u32,
    pub last_page: u32,
}

/// Address list page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresslist.html")]
pub struct AddressListTemplate {
    pub layout: Layout,
    pub addresses: Vec<Address>,
}

/// Discount file page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/discountfile.html")]
pub struct DiscountFileTemplate {
    pub layout: Layout,
    pub email: Option<String>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default, rename = "oldPass")]
    pub old_pass: String,
    #[serde(default, rename = "newPass")]
    pub new_pass: String,
    #[serde(default, rename = "newPassVerify")]
    pub new_pass_verify: String,
}

/// Body of the favorites ajax calls.
#[derive(Debug, Deserialize)]
pub struct FavoriteForm {
    #[serde(default)]
    pub product: String,
}

/// Remove address form data.
#[derive(Debug, Deserialize)]
pub struct RemoveAddressForm {
    pub id: Option<String>,
}

/// Order history query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load the full user record behind the session.
async fn load_user(state: &AppState, current: &CurrentUser) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
}

/// Group products by series, keeping the order in which series first appear.
#[must_use]
pub fn group_by_series(products: Vec<ProductView>) -> Vec<SeriesGroup> {
    let mut groups: Vec<SeriesGroup> = Vec::new();

    for product in products {
        match groups.iter_mut().find(|g| g.series == product.series) {
            Some(group) => group.products.push(product),
            None => groups.push(SeriesGroup {
                series: product.series.clone(),
                products: vec![product],
            }),
        }
    }

    groups
}

/// Reply of `modFav`.
#[must_use]
pub const fn toggle_reply(result: Option<Toggle>) -> &'static str {
    match result {
        Some(_) => "SUCCESS",
        None => "FAILED",
    }
}

/// Reply of `isFav`.
#[must_use]
pub fn membership_reply(user: &User, product: &str) -> &'static str {
    match ProductNumber::parse(product) {
        Ok(number) if user.favorites.contains(&number) => "IN_ARRAY",
        Ok(_) => "NOT_IN_ARRAY",
        Err(_) => "FAILED",
    }
}

// =============================================================================
// Overview & Password
// =============================================================================

/// Display account overview page.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<AccountIndexTemplate, AppError> {
    let user = load_user(&state, &current).await?;
    let order_count = OrderRepository::new(state.pool())
        .count_for(&user.login)
        .await?;

    Ok(AccountIndexTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        login: user.login.to_string(),
        company: user.company,
        email: user.email.map(|e| e.to_string()),
        order_count,
    })
}

/// Display the change password form.
pub async fn change_password_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<ChangePasswordTemplate, AppError> {
    Ok(ChangePasswordTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
    })
}

/// Handle the change password form.
#[instrument(skip_all, fields(login = %current.login))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Redirect, AppError> {
    let outcome = AuthService::new(state.pool())
        .change_password(
            &current.login,
            &form.old_pass,
            &form.new_pass,
            &form.new_pass_verify,
        )
        .await?;

    match outcome {
        PasswordChange::Changed => {
            flash::set_status(&session, outcome.message()).await?;
            Ok(Redirect::to("/account"))
        }
        _ => {
            flash::set_error(&session, outcome.message()).await?;
            Ok(Redirect::to("/account/changepassword"))
        }
    }
}

// =============================================================================
// Favorites
// =============================================================================

/// Display the favorites, grouped by series.
pub async fn favorites(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<FavoritesTemplate, AppError> {
    let user = load_user(&state, &current).await?;
    let products = ProductRepository::new(state.pool())
        .get_many(&user.favorites)
        .await?;
    let sheet = discounts::sheet_for(state.pool(), &user.login).await?;

    let views = products
        .iter()
        .map(|p| ProductView::new(p, Some(&sheet)))
        .collect();

    Ok(FavoritesTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        groups: group_by_series(views),
    })
}

/// Toggle a product in the favorites (ajax).
#[instrument(skip_all, fields(login = %current.login, product = %form.product))]
pub async fn mod_fav(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    _ajax: Ajax,
    Form(form): Form<FavoriteForm>,
) -> Result<&'static str, AppError> {
    let Ok(product) = ProductNumber::parse(&form.product) else {
        return Ok(toggle_reply(None));
    };

    let toggle = match UserRepository::new(state.pool())
        .toggle_favorite(current.id, product)
        .await
    {
        Ok(toggle) => toggle,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::Unauthorized("account no longer exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    add_breadcrumb("favorites", "Toggled favorite", Some(&[("product", form.product.as_str())]));
    tracing::debug!(?toggle, "Favorite toggled");

    Ok(toggle_reply(Some(toggle)))
}

/// Tell whether a product is a favorite (ajax).
pub async fn is_fav(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    _ajax: Ajax,
    Form(form): Form<FavoriteForm>,
) -> Result<&'static str, AppError> {
    let user = load_user(&state, &current).await?;
    Ok(membership_reply(&user, &form.product))
}

// =============================================================================
// Orders
// =============================================================================

/// Display the order history, newest first.
pub async fn order_history(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<OrderHistoryTemplate, AppError> {
    let page = OrderRepository::new(state.pool())
        .page_for(&current.login, query.page.unwrap_or(1), ORDERS_PER_PAGE)
        .await?;

    let orders = page
        .orders
        .into_iter()
        .map(|o| OrderView {
            id: o.id.to_string(),
            date: o.created_at.format("%d-%m-%Y %H:%M").to_string(),
            lines: o.lines,
        })
        .collect();

    Ok(OrderHistoryTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        orders,
        page: page.page,
        last_page: page.last_page,
    })
}

// =============================================================================
// Addresses
// =============================================================================

/// Display the address list with the add form.
pub async fn address_list(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<AddressListTemplate, AppError> {
    let addresses = AddressRepository::new(state.pool())
        .list_for(&current.login)
        .await?;

    Ok(AddressListTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        addresses,
    })
}

/// Handle the add address form.
#[instrument(skip_all, fields(login = %current.login))]
pub async fn add_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Redirect, AppError> {
    match form.validate() {
        Ok(address) => {
            AddressRepository::new(state.pool())
                .create(&current.login, &address)
                .await?;
            flash::set_status(&session, "Het adres is toegevoegd").await?;
        }
        Err(errors) => flash::set_errors(&session, errors).await?,
    }

    Ok(Redirect::to(ADDRESS_LIST_PATH))
}

/// Handle the remove address form.
#[instrument(skip_all, fields(login = %current.login))]
pub async fn remove_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<RemoveAddressForm>,
) -> Result<Redirect, AppError> {
    let Some(raw) = form.id.filter(|id| !id.trim().is_empty()) else {
        flash::set_error(&session, "Geen adres id aangegeven").await?;
        return Ok(Redirect::to(ADDRESS_LIST_PATH));
    };

    let removed = match raw.parse::<AddressId>() {
        Ok(id) => {
            AddressRepository::new(state.pool())
                .delete_owned(id, &current.login)
                .await?
        }
        Err(_) => false,
    };

    if removed {
        flash::set_status(&session, "Het adres is verwijderd").await?;
    } else {
        flash::set_error(
            &session,
            "Het adres bestaat niet of behoort niet bij uw account",
        )
        .await?;
    }

    Ok(Redirect::to(ADDRESS_LIST_PATH))
}

// =============================================================================
// Discount File
// =============================================================================

/// Display the discount file page.
pub async fn discount_file(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<DiscountFileTemplate, AppError> {
    let user = load_user(&state, &current).await?;

    Ok(DiscountFileTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        email: user.email.map(|e| e.to_string()),
    })
}

/// Download or mail the discount file: `/account/generate_{type}/{method}`.
#[instrument(skip(state, session, current), fields(login = %current.login))]
pub async fn generate(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path((generate, method)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some(kind) = generate.strip_prefix("generate_") else {
        return Err(AppError::NotFound(format!("/account/{generate}/{method}")));
    };

    let selection = kind
        .parse::<FileType>()
        .and_then(|file_type| method.parse::<Delivery>().map(|delivery| (file_type, delivery)));
    let (file_type, delivery) = match selection {
        Ok(selection) => selection,
        Err(e) => {
            flash::set_error(&session, e.to_string()).await?;
            return Ok(Redirect::to(DISCOUNT_FILE_PATH).into_response());
        }
    };

    let user = load_user(&state, &current).await?;
    let today = chrono::Local::now().date_naive();
    let file = discounts::build_file(
        state.pool(),
        &state.config().icc_gln,
        &user.login,
        &user.company,
        file_type,
        today,
    )
    .await?;

    match delivery {
        Delivery::Download => Ok(attachment(file_type, &file.file_name, file.content)),
        Delivery::Mail => {
            let Some(email) = user.email else {
                flash::set_error(&session, "Er is geen e-mailadres bekend voor uw account").await?;
                return Ok(Redirect::to(DISCOUNT_FILE_PATH).into_response());
            };

            state
                .email()
                .send_discount_file(&email, &user.company, file_type, file.file_name, file.content)
                .await?;

            flash::set_status(
                &session,
                format!("Het kortingsbestand is verzonden naar {email}"),
            )
            .await?;
            Ok(Redirect::to(DISCOUNT_FILE_PATH).into_response())
        }
    }
}

/// A file download response.
pub fn attachment(file_type: FileType, file_name: &str, content: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, file_type.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        content,
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wtg_core::{Favorites, Login, UserId};

    fn view(number: &str, series: &str) -> ProductView {
        ProductView {
            number: number.to_string(),
            name: format!("Product {number}"),
            series: series.to_string(),
            group: String::new(),
            price: "€ 1,00".to_string(),
            discount: None,
            net_price: None,
            special: false,
            clearance: false,
        }
    }

    fn user(favorites: &[&str]) -> User {
        User {
            id: UserId::new(1),
            login: Login::parse("13370").unwrap(),
            company: "Test BV".to_string(),
            email: None,
            is_admin: false,
            favorites: Favorites::from(
                favorites
                    .iter()
                    .map(|f| ProductNumber::parse(f).unwrap())
                    .collect::<Vec<_>>(),
            ),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_series_keeps_first_appearance() {
        let groups = group_by_series(vec![
            view("1000001", "Knel"),
            view("1000002", "Kranen"),
            view("1000003", "Knel"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].series, "Knel");
        assert_eq!(groups[0].products.len(), 2);
        assert_eq!(groups[1].series, "Kranen");
    }

    #[test]
    fn test_membership_reply() {
        let user = user(&["1234567"]);
        assert_eq!(membership_reply(&user, "1234567"), "IN_ARRAY");
        assert_eq!(membership_reply(&user, "7654321"), "NOT_IN_ARRAY");
        assert_eq!(membership_reply(&user, "12345"), "FAILED");
        assert_eq!(membership_reply(&user, ""), "FAILED");
    }

    #[test]
    fn test_toggle_reply() {
        assert_eq!(toggle_reply(Some(Toggle::Added)), "SUCCESS");
        assert_eq!(toggle_reply(Some(Toggle::Removed)), "SUCCESS");
        assert_eq!(toggle_reply(None), "FAILED");
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment(FileType::Csv, "icc_data13370.csv", b"x".to_vec());
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"icc_data13370.csv\""
        );

        let response = attachment(FileType::Icc, "icc_data13370.txt", b"x".to_vec());
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=windows-1252"
        );
    }
}
