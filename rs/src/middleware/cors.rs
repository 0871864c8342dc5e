//! CORS policy for the browser build of the client.
//!
//! CORS is enforced by browsers only; the native app and the CLI are not
//! affected by it.
//!
//! Policy:
//! - Configured origins (exact match) may send credentials.
//! - Empty allowlist in development: any origin, never with credentials.
//! - Empty allowlist in production: no CORS headers at all.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(60 * 10));

    let allowed: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| match HeaderValue::from_str(s) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %s, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    let cors = if !allowed.is_empty() {
        base.allow_origin(AllowOrigin::list(allowed))
            .allow_credentials(true)
    } else if config.app_env.is_production() {
        // Predicate that never matches: no CORS headers for anyone.
        base.allow_origin(AllowOrigin::predicate(|_, _| false))
    } else {
        base.allow_origin(Any)
    };

    router.layer(cors)
}
