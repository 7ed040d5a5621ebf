//! Route definitions for the lending API

mod guest;
mod loan;
mod payment;
mod trust;
mod user;
mod vouch;

use axum::http::{HeaderValue, Method};
use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{health_check, root};
use crate::middleware::{hsts_layer, rate_limit, request_tracing, security_headers, RateLimiter};
use crate::state::AppState;

pub use guest::guest_routes;
pub use loan::loan_routes;
pub use payment::payment_routes;
pub use trust::trust_routes;
pub use user::user_routes;
pub use vouch::vouch_routes;

/// Full application router with the middleware stack applied
pub fn create_router(state: AppState, config: &Config) -> Router {
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(trust_routes())
        .merge(vouch_routes())
        .merge(loan_routes())
        .merge(payment_routes())
        .merge(user_routes())
        .merge(guest_routes())
        .with_state(state)
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_tracing))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(configure_cors(config.cors_allowed_origins.as_deref())),
        );

    if config.environment.is_production() {
        app = app.layer(hsts_layer());
    }

    app
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}
