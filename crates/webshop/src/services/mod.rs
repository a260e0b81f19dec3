//! Business logic services.
//!
//! Services sit between the route handlers and the repositories. They hold
//! whatever is more than a single query: password handling, mail, parsing
//! of admin uploads and assembling discount files.

pub mod auth;
pub mod content;
pub mod discounts;
pub mod email;
pub mod import;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use import::ImportError;
