//! HTTP route handlers for the webshop.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page (content block `home`)
//! GET  /about                      - About page
//! GET  /contact                    - Contact page
//!
//! # Catalog
//! GET  /product/{number}           - Product detail
//! GET  /search?q=                  - Search
//! GET  /specials                   - Specials
//! GET  /clearance                  - Clearance
//!
//! # Cart (requires auth)
//! GET  /cart                       - Cart page
//! POST /cart/add                   - Add a product
//! POST /cart/update                - Change a quantity (0 removes)
//! GET  /cart/destroy               - Empty the cart
//! POST /cart/order                 - Place the order
//! GET  /cart/order/finished        - Confirmation
//! GET  /reorder/{id}               - Put an earlier order back in the cart
//!
//! # Auth
//! GET  /login                      - Login page
//! POST /login                      - Login action
//! GET  /logout                     - Logout
//!
//! # Account (requires auth)
//! GET  /account                    - Overview
//! GET  /account/changepassword     - Change password form
//! POST /account/changepassword     - Change password action
//! GET  /account/favorites          - Favorites grouped by series
//! POST /account/modFav             - Toggle a favorite (ajax)
//! POST /account/isFav              - Favorite check (ajax)
//! GET  /account/orderhistory       - Order history
//! GET  /account/addresslist        - Addresses
//! POST /account/addAddress         - Add an address
//! POST /account/removeAddress      - Remove an address
//! GET  /account/discountfile       - Discount file page
//! GET  /account/generate_{type}/{method} - Download or mail the discount file
//!
//! # Admin (requires admin flag)
//! GET  /admin                      - Overview
//! GET  /admin/import               - Import page
//! POST /admin/productimport        - Replace the catalog
//! POST /admin/discountimport       - Replace the discounts
//! GET  /admin/managecontent        - Content editor
//! GET  /admin/getContent?page=     - Markdown of a content block (JSON)
//! POST /admin/saveContent          - Save a content block
//! GET  /admin/usermanager          - User manager
//! GET  /admin/getUserData?id=      - User details (JSON)
//! POST /admin/updateUser           - Create or update a user
//! POST /admin/pricelist            - Discount file of any user
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod home;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_sessions::Session;

use crate::db::RepositoryError;
use crate::middleware::flash;
use crate::models::{Cart, CurrentUser, FlashMessage, session_keys};
use crate::services::content;
use crate::state::AppState;

/// Largest accepted admin upload.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Data every page shares: the header, flash messages and the footer.
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub flash: FlashMessage,
    pub cart_count: u32,
    pub footer: String,
}

impl Layout {
    /// Collect the layout data, consuming the pending flash message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the footer cannot be loaded.
    pub async fn load(
        pool: &PgPool,
        session: &Session,
        user: Option<CurrentUser>,
    ) -> Result<Self, RepositoryError> {
        let flash = flash::take(session).await;
        let cart_count = if user.is_some() {
            load_cart(session).await.count()
        } else {
            0
        };
        let footer = content::rendered(pool, "footer").await?;

        Ok(Self {
            user,
            flash,
            cart_count,
            footer,
        })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// The cart stored in the session, empty when there is none.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/about", get(home::about))
        .route("/contact", get(home::contact))
        .route("/product/{number}", get(catalog::product))
        .route("/search", get(catalog::search))
        .route("/specials", get(catalog::specials))
        .route("/clearance", get(catalog::clearance))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/destroy", get(cart::destroy))
        .route("/order", post(cart::order))
        .route("/order/finished", get(cart::finished))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route(
            "/changepassword",
            get(account::change_password_page).post(account::change_password),
        )
        .route("/favorites", get(account::favorites))
        .route("/modFav", post(account::mod_fav))
        .route("/isFav", post(account::is_fav))
        .route("/orderhistory", get(account::order_history))
        .route("/addresslist", get(account::address_list))
        .route("/addAddress", post(account::add_address))
        .route("/removeAddress", post(account::remove_address))
        .route("/discountfile", get(account::discount_file))
        .route("/{generate}/{method}", get(account::generate))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::overview))
        .route("/import", get(admin::import_page))
        .route("/productimport", post(admin::product_import))
        .route("/discountimport", post(admin::discount_import))
        .route("/managecontent", get(admin::manage_content))
        .route("/getContent", get(admin::get_content))
        .route("/saveContent", post(admin::save_content))
        .route("/usermanager", get(admin::user_manager))
        .route("/getUserData", get(admin::get_user_data))
        .route("/updateUser", post(admin::update_user))
        .route("/pricelist", post(admin::pricelist))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Create all routes for the webshop.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(auth_routes())
        .nest("/cart", cart_routes())
        .route("/reorder/{id}", get(cart::reorder))
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}
