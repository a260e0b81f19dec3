//! Core types for the WTG webshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod login;
pub mod percentage;
pub mod price;
pub mod product;

pub use email::{Email, EmailError};
pub use id::*;
pub use login::{Login, LoginError};
pub use percentage::{Percentage, PercentageError};
pub use price::Price;
pub use product::{ProductNumber, ProductNumberError};
