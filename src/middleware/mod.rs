//! Middleware for the lending API
//!
//! Request tracing, rate limiting, security headers and authentication.

pub mod auth;
mod rate_limiter;
mod security;
mod trace;

pub use auth::{AdminUser, AuthenticatedUser, ACCESS_TOKEN_COOKIE};
pub use rate_limiter::{rate_limit, RateLimiter};
pub use security::{hsts_layer, security_headers};
pub use self::trace::{request_tracing, REQUEST_ID_HEADER};
