//! HTTP middleware stack for the webshop.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Error reporting (Sentry user, maintainer mail)
//! 5. Security headers
//!
//! Authentication is not a layer: handlers ask for [`RequireAuth`],
//! [`RequireAdmin`] or [`OptionalAuth`].

pub mod ajax;
pub mod auth;
pub mod error_report;
pub mod flash;
pub mod security_headers;
pub mod session;

pub use ajax::Ajax;
pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use error_report::report_errors;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
