//! WTG Core - Shared domain types for the WTG webshop.
//!
//! This crate provides the types and pure business logic used by:
//! - `webshop` - The webshop server (catalog, cart, account, admin)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything in here can be tested without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, logins, product numbers, percentages
//! - [`discount`] - Discount tiers and their precedence rules
//! - [`export`] - ICC and CSV discount file formats
//! - [`favorites`] - The per-user favorites list

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod discount;
pub mod export;
pub mod favorites;
pub mod types;

pub use discount::{CodeColumn, DiscountRow, DiscountSheet, DiscountTable, SheetEntry};
pub use export::{Delivery, ExportError, FileType, IccHeader};
pub use favorites::{Favorites, Toggle};
pub use types::*;
