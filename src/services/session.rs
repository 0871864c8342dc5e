/*
 * Responsibility
 * - Session lifecycle: Unauthenticated -> Authenticating -> Authenticated | Failed
 * - Holds the single pending login slot (state + PKCE verifier)
 * - The access token exists only in the Authenticated state
 */
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::error::SessionError;
use crate::services::auth::pkce::PkceVerifier;
use crate::services::auth::{AccessToken, BeginLogin, PendingLogin, UserClaims};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Failed,
}

/// Why the last login attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginFailure {
    #[error("provider rejected the login: {error}")]
    ProviderRejected {
        error: String,
        description: Option<String>,
    },
    #[error("callback state did not match the login attempt")]
    StateMismatch,
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("could not fetch user claims: {0}")]
    ClaimsFetch(String),
    #[error("no usable login callback: {0}")]
    CallbackNotReceived(String),
}

impl LoginFailure {
    /// The provider answered with an error callback (denied, invalid request)
    /// as opposed to a transport or exchange failure.
    pub fn is_provider_rejection(&self) -> bool {
        matches!(self, Self::ProviderRejected { .. })
    }
}

#[derive(Debug)]
enum SessionState {
    Unauthenticated,
    Authenticating {
        pending: Option<PendingLogin>,
        authorize_url: Url,
    },
    Authenticated {
        user: UserClaims,
        token: AccessToken,
    },
    Failed(LoginFailure),
}

/// What `Session::login` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStart {
    /// A new attempt was started; send the user here.
    Redirect(Url),
    /// An attempt is already running; nothing new was started.
    AlreadyInProgress(Url),
    AlreadyAuthenticated,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            SessionState::Authenticating { .. } => SessionStatus::Authenticating,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
            SessionState::Failed(_) => SessionStatus::Failed,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&UserClaims> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Authenticated with a token whose lifetime ended at or before `now`.
    pub fn is_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token().is_some_and(|token| token.is_expired_at(now))
    }

    pub fn failure(&self) -> Option<&LoginFailure> {
        match &self.state {
            SessionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Starts a login attempt unless one is running or the user is already in.
    ///
    /// From `Failed` this counts as a retry.
    pub fn login(&mut self, idp: &dyn BeginLogin) -> LoginStart {
        match &self.state {
            SessionState::Authenticating { authorize_url, .. } => {
                tracing::debug!("login requested while an attempt is in flight");
                return LoginStart::AlreadyInProgress(authorize_url.clone());
            }
            SessionState::Authenticated { .. } => return LoginStart::AlreadyAuthenticated,
            SessionState::Unauthenticated | SessionState::Failed(_) => {}
        }

        let (url, pending) = idp.begin_login().into_parts();
        tracing::info!("login started");
        self.state = SessionState::Authenticating {
            pending: Some(pending),
            authorize_url: url.clone(),
        };
        LoginStart::Redirect(url)
    }

    /// Hands out the PKCE verifier for the callback carrying `state`. Single use.
    ///
    /// A mismatching `state` discards the attempt and fails the session.
    pub fn take_pending(&mut self, state: &str) -> Result<PkceVerifier, SessionError> {
        let SessionState::Authenticating { pending, .. } = &mut self.state else {
            return Err(self.invalid("take_pending"));
        };
        let Some(login) = pending.take() else {
            return Err(SessionError::NoPendingLogin);
        };

        if login.state() != state {
            tracing::warn!("callback state mismatch, discarding login attempt");
            self.state = SessionState::Failed(LoginFailure::StateMismatch);
            return Err(SessionError::StateMismatch);
        }
        Ok(login.into_verifier())
    }

    pub fn complete_login(
        &mut self,
        user: UserClaims,
        token: AccessToken,
    ) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Authenticating { .. }) {
            return Err(self.invalid("complete_login"));
        }
        tracing::info!(sub = %user.sub, "login completed");
        self.state = SessionState::Authenticated { user, token };
        Ok(())
    }

    pub fn fail_login(&mut self, reason: LoginFailure) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Authenticating { .. }) {
            return Err(self.invalid("fail_login"));
        }
        tracing::warn!(%reason, "login failed");
        self.state = SessionState::Failed(reason);
        Ok(())
    }

    /// `Failed -> Unauthenticated`.
    pub fn acknowledge_failure(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Failed(_)) {
            return Err(self.invalid("acknowledge_failure"));
        }
        self.state = SessionState::Unauthenticated;
        Ok(())
    }

    /// Valid from any state. Drops user, token and any pending attempt.
    pub fn logout(&mut self) -> SessionStatus {
        let previous = self.status();
        self.state = SessionState::Unauthenticated;
        tracing::info!(from = ?previous, "session cleared");
        previous
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.status(),
            operation,
        }
    }
}
