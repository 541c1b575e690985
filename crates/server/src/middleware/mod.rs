//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span)
//! 4. Security headers
//! 5. CORS
//! 6. Authorization gate (presence check, maintenance lockout)
//! 7. Login rate limiting (login route only)

pub mod auth;
pub mod gate;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod token;

pub use auth::{OptionalAdmin, PresentedToken, RequireAdmin};
pub use gate::{RouteClass, classify, gate_middleware};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use token::{
    ADMIN_TOKEN_COOKIE, ADMIN_TOKEN_HEADER, clear_session_cookie, extract_token, session_cookie,
};
