/*
 * Responsibility
 * - Config -> dependencies (key source, AuthService) -> Router
 * - Middleware order: security headers, CORS, then transport (request id, trace, limits)
 * - axum::serve()
 */
use std::{panic, process, sync::Arc, time::Duration};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::{AuthService, JwksCache, KeySource};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,resource_server=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting resource server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, addr = %config.addr, "bind failed");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "server error");
        AppError::Internal
    })?;

    Ok(())
}

/// Process-level services, injected into the shared state.
pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let keys = match &config.access_jwt_public_key_pem {
        Some(pem) => {
            tracing::info!("verifying access tokens with the configured ed25519 key");
            KeySource::ed25519_pem(pem).map_err(|e| {
                tracing::error!(error = %e, "ACCESS_JWT_PUBLIC_KEY_PEM is unusable");
                AppError::Internal
            })?
        }
        None => {
            tracing::info!(jwks = %config.jwks_uri, "verifying access tokens against provider keys");
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| {
                    tracing::error!(error = %e, "http client build failed");
                    AppError::Internal
                })?;
            KeySource::Jwks(JwksCache::new(config.jwks_uri.clone(), http))
        }
    };

    let auth = Arc::new(AuthService::new(
        keys,
        config.auth_issuer.clone(),
        config.auth_audience.clone(),
        config.access_token_leeway_seconds,
    ));

    Ok(AppState::new(auth))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::routes(state.clone()).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
