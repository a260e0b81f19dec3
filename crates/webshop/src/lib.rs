//! WTG webshop library.
//!
//! The binary in `main.rs` wires these modules into an axum server; keeping
//! them in a library lets the integration tests and the CLI reuse them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
