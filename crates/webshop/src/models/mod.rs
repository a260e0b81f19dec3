//! Domain models for the webshop.
//!
//! These are validated domain objects, separate from the raw database rows
//! in `crate::db`.

pub mod address;
pub mod cart;
pub mod content;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use address::{Address, AddressForm, NewAddress};
pub use cart::{Cart, CartLine};
pub use content::ContentBlock;
pub use order::{Order, OrderLine};
pub use product::Product;
pub use session::{CurrentUser, FlashMessage, keys as session_keys};
pub use user::User;
