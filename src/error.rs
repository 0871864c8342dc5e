/*
 * Responsibility
 * - Error kinds of the client core, one enum per concern
 * - AppError as the umbrella the orchestration layer returns
 */
use thiserror::Error;

use crate::config::ConfigError;
use crate::repos::error::RepoError;
use crate::services::session::{LoginFailure, SessionStatus};

/// Failure while exchanging an authorization code (or discovering the provider).
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("token endpoint unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("token endpoint rejected the exchange ({status}): {error}")]
    Provider {
        status: u16,
        error: String,
        description: Option<String>,
    },
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
    #[error("provider discovery failed: {0}")]
    Discovery(String),
}

/// Failure while reading the userinfo endpoint after a successful exchange.
#[derive(Debug, Error)]
pub enum ClaimsFetchError {
    #[error("userinfo endpoint unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("userinfo endpoint returned status {0}")]
    Status(u16),
    #[error("invalid userinfo response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepUpError {
    #[error("no verification challenge is pending")]
    NoChallenge,
    #[error("verification code has expired, request a new one")]
    ChallengeExpired,
    #[error("verification challenge was already used")]
    AlreadyConsumed,
    #[error("verification code is not valid")]
    InvalidCode,
    #[error("verification was cancelled")]
    Cancelled,
    #[error("unknown sensitive action")]
    UnknownAction,
}

#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("failed to persist consent: {0}")]
    Persist(#[from] RepoError),
    #[error("no consent has been recorded yet")]
    NotRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("invalid customer type: {0:?}")]
    InvalidCustomerType(String),
    #[error("select a customer type first")]
    CustomerTypeRequired,
    #[error("identity {0:?} is not available to this user")]
    UnknownIdentity(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// `authenticated` tells an expected 401 (no token sent) from a token the server refused.
    #[error("unauthorized (token sent: {authenticated})")]
    Unauthorized { authenticated: bool },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("api unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("invalid api response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// A 401 returned for a request that did carry a bearer token.
    pub fn is_session_rejected(&self) -> bool {
        matches!(self, Self::Unauthorized { authenticated: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{operation} is not valid while the session is {from:?}")]
    InvalidTransition {
        from: SessionStatus,
        operation: &'static str,
    },
    #[error("no login attempt is waiting for a callback")]
    NoPendingLogin,
    #[error("callback state does not match the pending login")]
    StateMismatch,
    #[error("select a customer type before logging in")]
    CustomerTypeRequired,
    #[error("callback is missing the {0} parameter")]
    MalformedCallback(&'static str),
    #[error("the session token has expired")]
    TokenExpired,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    ClaimsFetch(#[from] ClaimsFetchError),
    #[error("login failed: {0}")]
    LoginFailed(LoginFailure),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    StepUp(#[from] StepUpError),
    #[error(transparent)]
    Consent(#[from] ConsentError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}
