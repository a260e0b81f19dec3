//! Editable page content.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pages whose content admins can edit.
pub const EDITABLE_PAGES: &[&str] = &["home", "about", "contact", "footer"];

/// A named markdown block.
#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    pub name: String,
    pub markdown: String,
    pub updated_at: DateTime<Utc>,
}

/// Whether `name` is a page admins may edit.
#[must_use]
pub fn is_editable(name: &str) -> bool {
    EDITABLE_PAGES.contains(&name)
}
