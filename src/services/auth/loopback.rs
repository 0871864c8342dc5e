//! One-shot HTTP listener on the loopback redirect URI.
//!
//! Serves exactly one callback, hands its parameters to the waiting login flow
//! and shuts down.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use url::Url;

use crate::error::AppError;

use super::callback::CallbackParams;

type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

const DONE_PAGE: &str = "<!doctype html><html><body><p>Innloggingen er mottatt. Du kan lukke dette vinduet.</p></body></html>";
const MALFORMED_PAGE: &str =
    "<!doctype html><html><body><p>Ugyldig innloggingssvar.</p></body></html>";
const ALREADY_HANDLED_PAGE: &str =
    "<!doctype html><html><body><p>Denne innloggingen er allerede behandlet.</p></body></html>";

#[derive(Debug)]
pub struct LoopbackReceiver {
    redirect_uri: Url,
    rx: oneshot::Receiver<CallbackParams>,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl LoopbackReceiver {
    /// Listens on the host and port of `redirect_uri`; port 0 picks a free one.
    pub async fn bind(redirect_uri: &Url) -> io::Result<Self> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "redirect uri has no host"))?;
        let ip: IpAddr = match host {
            "localhost" => IpAddr::from([127, 0, 0, 1]),
            other => other
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "redirect host is not an ip"))?,
        };
        if !ip.is_loopback() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "redirect uri must point at the loopback interface",
            ));
        }
        let port = redirect_uri.port_or_known_default().unwrap_or(0);

        let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        let mut actual = redirect_uri.clone();
        actual
            .set_port(Some(local_addr.port()))
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "cannot set redirect port"))?;

        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new()
            .route(redirect_uri.path(), get(receive))
            .with_state(slot);

        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "loopback receiver failed");
            }
        });

        tracing::debug!(%local_addr, "loopback receiver listening");

        Ok(Self {
            redirect_uri: actual,
            rx,
            shutdown: Some(shutdown_tx),
            server,
        })
    }

    /// Redirect URI with the port actually bound.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    pub async fn wait(mut self, timeout: Duration) -> Result<CallbackParams, AppError> {
        let received = tokio::time::timeout(timeout, &mut self.rx).await;
        self.stop();
        if let Err(e) = (&mut self.server).await {
            tracing::warn!(error = %e, "loopback receiver task ended abnormally");
        }

        match received {
            Err(_) => Err(AppError::Timeout("login callback")),
            Ok(Err(_)) => Err(AppError::Io(io::Error::other("loopback receiver stopped"))),
            Ok(Ok(params)) => Ok(params),
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for LoopbackReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Only a well-formed callback uses up the slot; anything else gets a 400.
async fn receive(
    State(slot): State<CallbackSlot>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Html<&'static str>) {
    let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect::<Vec<_>>();
    let params = match CallbackParams::from_pairs(pairs) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "malformed login callback ignored");
            return (StatusCode::BAD_REQUEST, Html(MALFORMED_PAGE));
        }
    };

    let Some(tx) = slot.lock().await.take() else {
        return (StatusCode::CONFLICT, Html(ALREADY_HANDLED_PAGE));
    };
    let _ = tx.send(params);
    (StatusCode::OK, Html(DONE_PAGE))
}
