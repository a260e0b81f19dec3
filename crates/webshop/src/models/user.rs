//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wtg_core::{Email, Favorites, Login, UserId};

/// A webshop customer or administrator.
///
/// The password hash never leaves the repository, so this type is safe to
/// serialize into admin JSON responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    /// Debtor number.
    pub login: Login,
    pub company: String,
    pub email: Option<Email>,
    pub is_admin: bool,
    pub favorites: Favorites,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
