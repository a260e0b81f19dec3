//! Cart route handlers.
//!
//! The cart lives in the session. Prices and discounts are looked up when
//! the cart is shown; the placed order stores product, name and quantity
//! only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wtg_core::{AddressId, DiscountSheet, OrderId, Price, ProductNumber};

use crate::db::{AddressRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::ajax::back_path;
use crate::middleware::{RequireAuth, flash};
use crate::models::{Address, Cart, Product, session_keys};
use crate::services::discounts;
use crate::services::email::{EmailError, OrderMail};
use crate::state::AppState;

use super::{Layout, load_cart, save_cart};

const CART_PATH: &str = "/cart";
const FINISHED_PATH: &str = "/cart/order/finished";

/// Outcome of placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Mailed to the shop and stored. The cart is emptied.
    Placed(OrderId),
    /// The shop could not be mailed. Nothing is stored and the cart is kept.
    MailFailed,
}

impl Placement {
    fn after_mail(id: OrderId, sent: Result<(), EmailError>) -> Self {
        match sent {
            Ok(()) => Self::Placed(id),
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    order_id = %id,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Order mail failed, order rolled back"
                );
                Self::MailFailed
            }
        }
    }

    const fn redirect(self) -> &'static str {
        match self {
            Self::Placed(_) => FINISHED_PATH,
            Self::MailFailed => CART_PATH,
        }
    }
}

/// Cart line display data for templates.
pub struct CartLineView {
    pub number: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub discount: Option<String>,
    pub line_total: String,
}

/// Cart display data for templates.
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
}

impl CartView {
    /// Price the cart lines. Lines whose product left the catalog show no
    /// price and do not count towards the total.
    #[must_use]
    pub fn new(cart: &Cart, products: &[Product], sheet: &DiscountSheet) -> Self {
        let mut total = Price::new(Decimal::ZERO);
        let mut lines = Vec::with_capacity(cart.lines().len());

        for line in cart.lines() {
            let product = products.iter().find(|p| p.number == line.product);
            let (price, discount, line_total) = match product {
                Some(product) => {
                    let discount = sheet.product_discount(product.number.as_str(), &product.group);
                    let line_total = product.net_price(discount).times(line.quantity);
                    total = Price::new(total.amount() + line_total.amount());
                    (
                        product.price.to_string(),
                        discount.map(|d| d.to_string()),
                        line_total.to_string(),
                    )
                }
                None => ("-".to_string(), None, "-".to_string()),
            };

            lines.push(CartLineView {
                number: line.product.to_string(),
                name: line.name.clone(),
                quantity: line.quantity,
                price,
                discount,
                line_total,
            });
        }

        Self {
            lines,
            total: total.to_string(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub addresses: Vec<Address>,
}

/// Order placed page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/finished.html")]
pub struct OrderFinishedTemplate {
    pub layout: Layout,
    pub order_id: Option<OrderId>,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product: String,
    pub quantity: u32,
}

/// Place order form data.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub address: Option<String>,
    #[serde(default)]
    pub comment: String,
}

/// Display cart page.
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<CartShowTemplate, AppError> {
    let cart = load_cart(&session).await;
    let products = ProductRepository::new(state.pool())
        .get_many(cart.lines().iter().map(|l| &l.product))
        .await?;
    let sheet = discounts::sheet_for(state.pool(), &current.login).await?;
    let addresses = AddressRepository::new(state.pool())
        .list_for(&current.login)
        .await?;

    Ok(CartShowTemplate {
        cart: CartView::new(&cart, &products, &sheet),
        addresses,
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
    })
}

/// Add a product to the cart and go back to where the form was.
#[instrument(skip(state, session, headers, current))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(current): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let back = back_path(&headers);
    let quantity = form.quantity.unwrap_or(1);

    let product = match ProductNumber::parse(&form.product) {
        Ok(number) => ProductRepository::new(state.pool()).get(&number).await?,
        Err(_) => None,
    };
    let Some(product) = product else {
        flash::set_error(&session, "Dit product bestaat niet").await?;
        return Ok(Redirect::to(&back));
    };
    if quantity == 0 {
        flash::set_error(&session, "Het aantal moet minimaal 1 zijn").await?;
        return Ok(Redirect::to(&back));
    }

    let mut cart = load_cart(&session).await;
    cart.add(product.number.clone(), product.name.clone(), quantity);
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product", product.number.as_str())]));
    flash::set_status(
        &session,
        format!("{} is toegevoegd aan uw winkelwagen", product.name),
    )
    .await?;

    Ok(Redirect::to(&back))
}

/// Change the quantity of a line; zero removes it.
#[instrument(skip(session, current))]
pub async fn update(
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = load_cart(&session).await;

    let updated = ProductNumber::parse(&form.product)
        .is_ok_and(|number| cart.update(&number, form.quantity));

    if updated {
        save_cart(&session, &cart).await?;
        let message = if form.quantity == 0 {
            "Het product is verwijderd uit uw winkelwagen"
        } else {
            "Uw winkelwagen is bijgewerkt"
        };
        flash::set_status(&session, message).await?;
    } else {
        flash::set_error(&session, "Dit product zit niet in uw winkelwagen").await?;
    }

    Ok(Redirect::to(CART_PATH))
}

/// Empty the cart.
pub async fn destroy(
    session: Session,
    RequireAuth(_current): RequireAuth,
) -> Result<Redirect, AppError> {
    session.remove::<Cart>(session_keys::CART).await?;
    flash::set_status(&session, "Uw winkelwagen is geleegd").await?;
    Ok(Redirect::to(CART_PATH))
}

/// Place the order: store the snapshot and mail the shop in one step, then
/// empty the cart. A failed mail leaves no order and keeps the cart.
#[instrument(skip_all, fields(login = %current.login))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<OrderForm>,
) -> Result<Redirect, AppError> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        flash::set_error(&session, "Uw winkelwagen is leeg").await?;
        return Ok(Redirect::to(CART_PATH));
    }

    let addresses = AddressRepository::new(state.pool())
        .list_for(&current.login)
        .await?;
    let address = form
        .address
        .as_deref()
        .and_then(|raw| raw.parse::<AddressId>().ok())
        .and_then(|id| addresses.iter().find(|a| a.id == id));

    let lines = cart.to_order_lines();
    let mut tx = OrderRepository::new(state.pool()).begin().await?;
    let order = OrderRepository::create(&mut tx, &current.login, &lines).await?;

    let sent = state
        .email()
        .send_order(
            &state.config().order_email,
            &OrderMail {
                id: order.id,
                login: &current.login,
                company: &current.company,
                lines: &order.lines,
                address,
                comment: form.comment.trim(),
            },
        )
        .await;

    let placement = Placement::after_mail(order.id, sent);
    match placement {
        Placement::Placed(id) => {
            tx.commit().await.map_err(RepositoryError::from)?;
            session.remove::<Cart>(session_keys::CART).await?;
            session.insert(session_keys::LAST_ORDER, id).await?;
            tracing::info!(order_id = %id, lines = lines.len(), "Order placed");
        }
        Placement::MailFailed => {
            tx.rollback().await.map_err(RepositoryError::from)?;
            flash::set_error(
                &session,
                "Uw bestelling kon niet worden verstuurd. Uw winkelwagen is bewaard, probeer het later opnieuw.",
            )
            .await?;
        }
    }

    Ok(Redirect::to(placement.redirect()))
}

/// Display the order confirmation.
pub async fn finished(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<OrderFinishedTemplate, AppError> {
    let order_id = session
        .remove::<OrderId>(session_keys::LAST_ORDER)
        .await?;

    Ok(OrderFinishedTemplate {
        layout: Layout::load(state.pool(), &session, Some(current)).await?,
        order_id,
    })
}

/// Add the lines of an earlier order to the cart.
#[instrument(skip(state, session, current))]
pub async fn reorder(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let order = match id.parse::<OrderId>() {
        Ok(id) => {
            OrderRepository::new(state.pool())
                .get_owned(id, &current.login)
                .await?
        }
        Err(_) => None,
    };
    let Some(order) = order else {
        return Err(AppError::NotFound(format!("order {id}")));
    };

    let products = ProductRepository::new(state.pool())
        .get_many(order.lines.iter().map(|l| &l.product))
        .await?;

    let mut cart = load_cart(&session).await;
    let mut skipped = Vec::new();
    for line in &order.lines {
        match products.iter().find(|p| p.number == line.product) {
            Some(product) => cart.add(product.number.clone(), product.name.clone(), line.quantity),
            None => skipped.push(format!(
                "{} ({}) is niet meer leverbaar",
                line.name, line.product
            )),
        }
    }
    save_cart(&session, &cart).await?;

    flash::set_status(&session, "De producten zijn aan uw winkelwagen toegevoegd").await?;
    if !skipped.is_empty() {
        flash::set_errors(&session, skipped).await?;
    }

    Ok(Redirect::to(CART_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use wtg_core::{DiscountRow, DiscountTable, Login, Percentage};

    fn product(number: &str, group: &str, price: &str) -> Product {
        Product {
            number: ProductNumber::parse(number).unwrap(),
            name: format!("Product {number}"),
            series: "Serie".to_string(),
            group: group.to_string(),
            price: Price::new(Decimal::from_str(price).unwrap()),
            special: false,
            clearance: false,
        }
    }

    #[test]
    fn test_cart_view_applies_discount_and_totals() {
        let login = Login::parse("13370").unwrap();
        let sheet = DiscountSheet::resolve(
            &login,
            vec![DiscountRow {
                table: DiscountTable::GroupBound,
                login: Some(login.clone()),
                code: "KN01".to_string(),
                group_description: "Knel".to_string(),
                product_description: String::new(),
                percentage: Percentage::new(Decimal::from(10)).unwrap(),
            }],
        );
        let products = vec![
            product("1000001", "KN01", "10.00"),
            product("1000002", "XX99", "2.50"),
        ];

        let mut cart = Cart::default();
        cart.add(ProductNumber::parse("1000001").unwrap(), "A".to_string(), 2);
        cart.add(ProductNumber::parse("1000002").unwrap(), "B".to_string(), 4);
        cart.add(ProductNumber::parse("1000003").unwrap(), "Weg".to_string(), 1);

        let view = CartView::new(&cart, &products, &sheet);

        assert_eq!(view.lines.len(), 3);
        assert_eq!(view.lines[0].discount.as_deref(), Some("10%"));
        assert_eq!(view.lines[0].line_total, "€ 18,00");
        assert_eq!(view.lines[1].discount, None);
        assert_eq!(view.lines[1].line_total, "€ 10,00");
        assert_eq!(view.lines[2].line_total, "-");
        assert_eq!(view.total, "€ 28,00");
    }

    #[test]
    fn test_order_is_placed_once_mailed() {
        let id = OrderId::new(42);
        let placement = Placement::after_mail(id, Ok(()));

        assert_eq!(placement, Placement::Placed(id));
        assert_eq!(placement.redirect(), "/cart/order/finished");
    }

    #[test]
    fn test_failed_order_mail_returns_to_cart() {
        let sent = Err(EmailError::InvalidAddress("bestellingen@".to_string()));
        let placement = Placement::after_mail(OrderId::new(42), sent);

        assert_eq!(placement, Placement::MailFailed);
        assert_eq!(placement.redirect(), "/cart");
    }
}
