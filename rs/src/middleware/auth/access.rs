//! Bearer access token (JWT) verification -> AuthCtx in request extensions.
//!
//! Any failure (no header, wrong scheme, bad signature, wrong iss/aud, expired)
//! ends in the same bodiless 401; the reason only goes to the log.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Puts `routes` behind bearer verification.
///
/// Uses `route_layer`, so unknown paths still answer 404 rather than 401.
pub fn apply(routes: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 from_fn cannot take a State extractor, hence from_fn_with_state
    routes.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(&req) else {
        tracing::debug!(path = %req.uri().path(), "request without bearer token");
        return Err(AppError::Unauthorized);
    };

    let verified = match state.auth.verify(token).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(sub = %verified.subject, "access token verified");
    req.extensions_mut().insert(AuthCtx::from(verified));

    Ok(next.run(req).await)
}
