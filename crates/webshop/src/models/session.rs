//! Session-related types.
//!
//! Types stored in the session for authentication state, the cart and
//! one-shot flash messages.

use serde::{Deserialize, Serialize};

use wtg_core::{Login, UserId};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Debtor number.
    pub login: Login,
    /// Company name, shown in the header and sent to Sentry.
    pub company: String,
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            company: user.company.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    /// Green confirmation, e.g. `Het adres is toegevoegd`.
    pub status: Option<String>,
    /// Red error lines.
    pub errors: Vec<String>,
}

impl FlashMessage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.errors.is_empty()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";

    /// Key for the id of the order just placed, shown on the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}
