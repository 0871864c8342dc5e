/*
 * Responsibility
 * - URL structure: /, /health, /public open; /protected behind bearer verification
 * - Unknown paths answer 404 (never 401)
 */
use axum::{Router, routing::get};

use crate::api::handlers::{
    health::health, protected::protected, public::public, root::root,
};
use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/protected", get(protected));
    let protected = middleware::auth::access::apply(protected, state);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/public", get(public))
        .merge(protected)
        .fallback(|| async { AppError::not_found("route") })
}
