//! Catalog route handlers.
//!
//! Prices are public; logged-in customers also see their discount and net
//! price.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wtg_core::{DiscountSheet, ProductNumber};

use crate::db::ProductRepository;
use crate::db::products::Listing;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Product};
use crate::services::discounts;
use crate::state::AppState;

use super::Layout;

/// Maximum number of search results shown.
const SEARCH_LIMIT: i64 = 100;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub number: String,
    pub name: String,
    pub series: String,
    pub group: String,
    pub price: String,
    pub discount: Option<String>,
    pub net_price: Option<String>,
    pub special: bool,
    pub clearance: bool,
}

impl ProductView {
    /// Build the view, applying the customer's discount when there is one.
    #[must_use]
    pub fn new(product: &Product, sheet: Option<&DiscountSheet>) -> Self {
        let discount = sheet.and_then(|s| s.product_discount(product.number.as_str(), &product.group));

        Self {
            number: product.number.to_string(),
            name: product.name.clone(),
            series: product.series.clone(),
            group: product.group.clone(),
            price: product.price.to_string(),
            discount: discount.map(|d| d.to_string()),
            net_price: discount.map(|d| product.net_price(Some(d)).to_string()),
            special: product.special,
            clearance: product.clearance,
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub is_favorite: bool,
}

/// Product list page template (search, specials, clearance).
#[derive(Template, WebTemplate)]
#[template(path = "catalog/list.html")]
pub struct ProductListTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub query: String,
    pub products: Vec<ProductView>,
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// The discount sheet of the visitor, if logged in.
async fn visitor_sheet(
    state: &AppState,
    user: Option<&CurrentUser>,
) -> Result<Option<DiscountSheet>, AppError> {
    match user {
        Some(user) => Ok(Some(discounts::sheet_for(state.pool(), &user.login).await?)),
        None => Ok(None),
    }
}

/// Display a product.
#[instrument(skip(state, session, user))]
pub async fn product(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(number): Path<String>,
) -> Result<ProductTemplate, AppError> {
    let number = ProductNumber::parse(&number)
        .map_err(|_| AppError::NotFound(format!("product {number}")))?;

    let product = ProductRepository::new(state.pool())
        .get(&number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {number}")))?;

    let sheet = visitor_sheet(&state, user.as_ref()).await?;

    let is_favorite = match &user {
        Some(user) => crate::db::UserRepository::new(state.pool())
            .get_by_id(user.id)
            .await?
            .is_some_and(|u| u.favorites.contains(&number)),
        None => false,
    };

    let layout = Layout::load(state.pool(), &session, user).await?;

    Ok(ProductTemplate {
        layout,
        product: ProductView::new(&product, sheet.as_ref()),
        is_favorite,
    })
}

/// Search the catalog.
#[instrument(skip(state, session, user))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> Result<ProductListTemplate, AppError> {
    let q = query.q.trim().to_string();
    let products = if q.is_empty() {
        Vec::new()
    } else {
        ProductRepository::new(state.pool())
            .search(&q, SEARCH_LIMIT)
            .await?
    };

    list(&state, &session, user, "Zoeken", q, &products).await
}

/// Display the specials.
pub async fn specials(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ProductListTemplate, AppError> {
    let products = ProductRepository::new(state.pool())
        .listing(Listing::Specials)
        .await?;
    list(&state, &session, user, "Acties", String::new(), &products).await
}

/// Display the clearance products.
pub async fn clearance(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ProductListTemplate, AppError> {
    let products = ProductRepository::new(state.pool())
        .listing(Listing::Clearance)
        .await?;
    list(&state, &session, user, "Opruiming", String::new(), &products).await
}

async fn list(
    state: &AppState,
    session: &Session,
    user: Option<CurrentUser>,
    title: &'static str,
    query: String,
    products: &[Product],
) -> Result<ProductListTemplate, AppError> {
    let sheet = visitor_sheet(state, user.as_ref()).await?;
    let products = products
        .iter()
        .map(|p| ProductView::new(p, sheet.as_ref()))
        .collect();

    Ok(ProductListTemplate {
        layout: Layout::load(state.pool(), session, user).await?,
        title,
        query,
        products,
    })
}
