/*
 * Responsibility
 * - The one client context: session, consent gate, profile selector, step-up
 * - Built once from config (explicit construction, no ambient globals)
 * - Sequences the cross-component steps: callback -> session, logout -> resets
 */
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{ClientConfig, ConfigError};
use crate::error::{AppError, ExchangeError, SessionError};
use crate::repos::FileConsentStore;
use crate::services::api_client::{ApiClient, ProtectedResponse, PublicResponse};
use crate::services::auth::{
    CallbackParams, LoopbackReceiver, OAuthSettings, ProviderEndpoints, TokenExchangeClient,
    UserClaims,
};
use crate::services::consent::{ConsentGate, ConsentOutcome, ConsentSelections};
use crate::services::customer_data::{Insurance, MockDataSource};
use crate::services::customer_data::profile::UserProfile;
use crate::services::profile::{Identity, ProfileSelector};
use crate::services::session::{LoginFailure, LoginStart, Session, SessionStatus};
use crate::services::step_up::{DemoCodeVerifier, StepUpAuthenticator};

#[derive(Debug)]
pub struct AppState {
    session: Session,
    idp: TokenExchangeClient,
    api: ApiClient,
    require_customer_type: bool,

    pub consent: ConsentGate,
    pub profiles: ProfileSelector,
    pub step_up: StepUpAuthenticator,
}

impl AppState {
    pub fn new(
        idp: TokenExchangeClient,
        api: ApiClient,
        consent: ConsentGate,
        profiles: ProfileSelector,
        step_up: StepUpAuthenticator,
    ) -> Self {
        Self {
            session: Session::new(),
            idp,
            api,
            require_customer_type: true,
            consent,
            profiles,
            step_up,
        }
    }

    #[must_use]
    pub fn require_customer_type(mut self, required: bool) -> Self {
        self.require_customer_type = required;
        self
    }

    pub async fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(ExchangeError::Network)?;

        let base = config.provider_base_url()?;
        let settings = OAuthSettings::new(
            config.client_id.clone(),
            config.audience.clone(),
            config.redirect_uri.clone(),
        );

        let idp = match TokenExchangeClient::discover(settings.clone(), &base, http.clone()).await {
            Ok(idp) => idp,
            Err(e) => {
                tracing::warn!(error = %e, "provider discovery failed, using conventional endpoints");
                let endpoints = ProviderEndpoints::conventional(&base)
                    .map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))?;
                TokenExchangeClient::new(settings, endpoints).with_http_client(http.clone())
            }
        };

        let mut consent = ConsentGate::new(
            Arc::new(FileConsentStore::new(&config.consent_store_dir)),
            config.consent_persist_policy,
        );
        consent.load().await?;

        let state = Self::new(
            idp,
            ApiClient::new(config.api_base_url.clone(), http),
            consent,
            ProfileSelector::new(Arc::new(MockDataSource::new())),
            StepUpAuthenticator::new(Box::new(DemoCodeVerifier::new(config.step_up_lenient_codes))),
        )
        .require_customer_type(config.require_customer_type);

        tracing::info!(
            authorize = %state.idp.endpoints().authorization,
            api = %state.api.base_url(),
            "client initialized"
        );
        Ok(state)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn idp(&self) -> &TokenExchangeClient {
        &self.idp
    }

    pub fn user(&self) -> Option<&UserClaims> {
        self.session.user()
    }

    /// Starts login; refuses until a customer type is chosen when that is required.
    pub fn login(&mut self) -> Result<LoginStart, AppError> {
        if self.require_customer_type && self.profiles.customer_type().is_none() {
            return Err(SessionError::CustomerTypeRequired.into());
        }
        Ok(self.session.login(&self.idp))
    }

    /// Finishes the login attempt with the provider's redirect parameters.
    ///
    /// Every failure leaves the session in `Failed`; a claims failure discards
    /// the freshly issued token.
    pub async fn handle_callback(&mut self, params: CallbackParams) -> Result<(), AppError> {
        let (code, state) = match params {
            CallbackParams::Error {
                error, description, ..
            } => {
                let failure = LoginFailure::ProviderRejected { error, description };
                self.session.fail_login(failure.clone())?;
                return Err(AppError::LoginFailed(failure));
            }
            CallbackParams::Code { code, state } => (code, state),
        };

        let verifier = match self.session.take_pending(&state) {
            Ok(verifier) => verifier,
            Err(SessionError::StateMismatch) => {
                return Err(AppError::LoginFailed(LoginFailure::StateMismatch));
            }
            Err(e) => return Err(e.into()),
        };

        let tokens = match self.idp.exchange_code(&code, verifier).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.session.fail_login(LoginFailure::Exchange(e.to_string()))?;
                return Err(e.into());
            }
        };

        let claims = match self.idp.fetch_claims(&tokens.access_token).await {
            Ok(claims) => claims,
            Err(e) => {
                drop(tokens);
                self.session.fail_login(LoginFailure::ClaimsFetch(e.to_string()))?;
                return Err(e.into());
            }
        };

        self.session.complete_login(claims, tokens.access_token)?;
        Ok(())
    }

    /// Waits for the provider redirect on `receiver` and finishes login with it.
    ///
    /// No callback within `timeout` fails the running attempt.
    pub async fn await_callback(
        &mut self,
        receiver: LoopbackReceiver,
        timeout: Duration,
    ) -> Result<(), AppError> {
        match receiver.wait(timeout).await {
            Ok(params) => self.handle_callback(params).await,
            Err(e) => {
                self.abandon_login(e.to_string())?;
                Err(e)
            }
        }
    }

    /// Gives up on the running login attempt and drops its PKCE verifier.
    /// Nothing happens outside `Authenticating`.
    pub fn abandon_login(&mut self, reason: impl Into<String>) -> Result<(), AppError> {
        if self.session.status() != SessionStatus::Authenticating {
            return Ok(());
        }
        self.session
            .fail_login(LoginFailure::CallbackNotReceived(reason.into()))?;
        Ok(())
    }

    /// Ends the session, with the same resets as `logout`, once its token has expired.
    /// Returns whether it did.
    pub async fn end_expired_session(&mut self) -> bool {
        if !self.session.is_token_expired_at(Utc::now()) {
            return false;
        }
        tracing::info!("access token expired, logging out");
        if let Err(e) = self.logout().await {
            tracing::warn!(error = %e, "logout after token expiry was incomplete");
        }
        true
    }

    /// Logged in but no consent recorded yet.
    pub fn consent_required(&self) -> bool {
        self.session.is_authenticated() && !self.consent.is_satisfied()
    }

    pub async fn accept_consent(
        &mut self,
        selections: ConsentSelections,
    ) -> Result<ConsentOutcome, AppError> {
        Ok(self.consent.accept(selections).await?)
    }

    /// Activates the default identity for the logged-in user.
    pub async fn initialize_profile(&mut self) -> Result<Option<&Identity>, AppError> {
        let user_id = self.require_user()?.sub.clone();
        Ok(self.profiles.initialize_default(&user_id).await?)
    }

    pub async fn available_identities(&self) -> Vec<Identity> {
        match self.session.user() {
            Some(user) => self.profiles.available_identities(&user.sub).await,
            None => Vec::new(),
        }
    }

    pub async fn switch_identity(&mut self, identity_id: &str) -> Result<&Identity, AppError> {
        let user_id = self.require_user()?.sub.clone();
        Ok(self.profiles.switch_to_id(&user_id, identity_id).await?)
    }

    pub async fn visible_insurances(&self) -> Vec<Insurance> {
        match self.session.user() {
            Some(user) => self.profiles.visible_insurances(&user.sub).await,
            None => Vec::new(),
        }
    }

    pub async fn user_profile(&self) -> Option<UserProfile> {
        match self.session.user() {
            Some(user) => Some(self.profiles.source().user_profile(user).await),
            None => None,
        }
    }

    pub async fn call_public(&self) -> Result<PublicResponse, AppError> {
        Ok(self.api.call_public().await?)
    }

    /// Calls `/protected` with the session token. An expired token, or one the
    /// server refuses, ends the session.
    pub async fn call_protected(&mut self) -> Result<ProtectedResponse, AppError> {
        if self.end_expired_session().await {
            return Err(SessionError::TokenExpired.into());
        }
        let token = self.session.access_token().cloned();
        match self.api.call_protected(token.as_ref()).await {
            Ok(body) => Ok(body),
            Err(e) if e.is_session_rejected() => {
                tracing::warn!("session token rejected by resource server, logging out");
                if let Err(reset) = self.logout().await {
                    tracing::warn!(error = %reset, "logout after rejected token was incomplete");
                }
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Clears step-up, consent and profile state, then the session.
    ///
    /// The session always ends up `Unauthenticated`; a consent storage failure
    /// is returned after everything else has been reset.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.step_up.reset();
        let consent = self.consent.reset().await;
        self.profiles.reset();
        self.session.logout();
        consent.map_err(AppError::from)
    }

    /// Local account deletion: withdraws all consent and logs out.
    pub async fn delete_account(&mut self) -> Result<(), AppError> {
        tracing::info!(sub = ?self.session.user().map(|u| &u.sub), "account deletion requested");
        self.step_up.reset();
        let consent = self.consent.revoke_all().await;
        self.profiles.reset();
        self.session.logout();
        consent.map_err(AppError::from)
    }

    fn require_user(&self) -> Result<&UserClaims, AppError> {
        self.session.user().ok_or_else(|| {
            SessionError::InvalidTransition {
                from: self.session.status(),
                operation: "profile access",
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsentPersistPolicy;
    use crate::repos::MemoryConsentStore;
    use crate::services::profile::CustomerType;
    use crate::services::auth::AccessToken;
    use chrono::TimeDelta;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(idp_base: &str, api_base: &str) -> AppState {
        let base: Url = format!("{idp_base}/").parse().unwrap();
        let idp = TokenExchangeClient::new(
            OAuthSettings::new(
                "client-123",
                "https://ciam-demo-api",
                "http://127.0.0.1:8765/callback".parse().unwrap(),
            ),
            ProviderEndpoints::conventional(&base).unwrap(),
        );
        AppState::new(
            idp,
            ApiClient::new(api_base.parse().unwrap(), reqwest::Client::new()),
            ConsentGate::new(
                Arc::new(MemoryConsentStore::new()),
                ConsentPersistPolicy::FailOpen,
            ),
            ProfileSelector::new(Arc::new(MockDataSource::new())),
            StepUpAuthenticator::new(Box::new(DemoCodeVerifier::strict())),
        )
    }

    fn state_param(start: &LoginStart) -> String {
        let LoginStart::Redirect(url) = start else {
            panic!("expected redirect, got {start:?}");
        };
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    async fn mount_idp(server: &MockServer, userinfo_status: u16) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(userinfo_status).set_body_json(
                serde_json::json!({ "sub": "auth0|42", "email": "kari@example.no" }),
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_requires_customer_type() {
        let mut state = state_for("https://idp.example", "http://localhost:8080");

        let err = state.login().unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::CustomerTypeRequired)
        ));
        assert_eq!(state.session().status(), SessionStatus::Unauthenticated);

        let mut relaxed =
            state_for("https://idp.example", "http://localhost:8080").require_customer_type(false);
        assert!(matches!(relaxed.login().unwrap(), LoginStart::Redirect(_)));
    }

    #[tokio::test]
    async fn successful_callback_authenticates_and_gates_on_consent() {
        let idp = MockServer::start().await;
        mount_idp(&idp, 200).await;
        let mut state = state_for(&idp.uri(), "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Private);

        let start = state.login().unwrap();
        state
            .handle_callback(CallbackParams::Code {
                code: "abc".into(),
                state: state_param(&start),
            })
            .await
            .unwrap();

        assert_eq!(state.session().status(), SessionStatus::Authenticated);
        assert_eq!(state.user().unwrap().sub, "auth0|42");
        assert!(state.consent_required());

        let outcome = state
            .accept_consent(ConsentSelections {
                analytics: true,
                marketing: false,
                third_party: true,
            })
            .await
            .unwrap();
        assert!(outcome.persisted);
        assert!(outcome.record.necessary());
        assert!(!state.consent_required());

        assert_eq!(state.initialize_profile().await.unwrap().unwrap().id, "self");
    }

    #[tokio::test]
    async fn claims_failure_discards_token() {
        let idp = MockServer::start().await;
        mount_idp(&idp, 500).await;
        let mut state = state_for(&idp.uri(), "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Private);

        let start = state.login().unwrap();
        let err = state
            .handle_callback(CallbackParams::Code {
                code: "abc".into(),
                state: state_param(&start),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ClaimsFetch(_)));
        assert_eq!(state.session().status(), SessionStatus::Failed);
        assert!(state.session().access_token().is_none());
    }

    #[tokio::test]
    async fn provider_error_callback_fails_login() {
        let mut state = state_for("https://idp.example", "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Business);
        state.login().unwrap();

        let err = state
            .handle_callback(CallbackParams::Error {
                error: "access_denied".into(),
                description: Some("User did not authorize the request".into()),
                state: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LoginFailed(ref f) if f.is_provider_rejection()));
        assert_eq!(state.session().status(), SessionStatus::Failed);
    }

    #[tokio::test]
    async fn forged_state_never_reaches_token_endpoint() {
        let idp = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&idp)
            .await;
        let mut state = state_for(&idp.uri(), "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Private);
        state.login().unwrap();

        let err = state
            .handle_callback(CallbackParams::Code {
                code: "abc".into(),
                state: "forged".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LoginFailed(LoginFailure::StateMismatch)));
        assert_eq!(state.session().status(), SessionStatus::Failed);
    }

    #[tokio::test]
    async fn rejected_token_logs_out_and_resets_everything() {
        let idp = MockServer::start().await;
        mount_idp(&idp, 200).await;
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&api)
            .await;

        let mut state = state_for(&idp.uri(), &api.uri());
        state.profiles.set_customer_type(CustomerType::Private);
        let start = state.login().unwrap();
        state
            .handle_callback(CallbackParams::Code {
                code: "abc".into(),
                state: state_param(&start),
            })
            .await
            .unwrap();
        state.accept_consent(ConsentSelections::default()).await.unwrap();
        state.initialize_profile().await.unwrap();

        let err = state.call_protected().await.unwrap_err();

        assert!(matches!(err, AppError::Api(ref e) if e.is_session_rejected()));
        assert_eq!(state.session().status(), SessionStatus::Unauthenticated);
        assert!(!state.consent.is_satisfied());
        assert!(state.profiles.active().is_none());
        assert!(state.profiles.customer_type().is_none());
    }

    #[tokio::test]
    async fn missing_callback_fails_the_attempt() {
        let idp = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&idp)
            .await;
        let mut state = state_for(&idp.uri(), "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Private);
        let receiver = LoopbackReceiver::bind(&"http://127.0.0.1:0/callback".parse().unwrap())
            .await
            .unwrap();
        state.login().unwrap();

        let err = state
            .await_callback(receiver, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Timeout("login callback")));
        assert_eq!(state.session().status(), SessionStatus::Failed);
        assert!(matches!(
            state.session().failure(),
            Some(LoginFailure::CallbackNotReceived(_))
        ));
        assert!(matches!(state.login().unwrap(), LoginStart::Redirect(_)));
    }

    #[tokio::test]
    async fn abandoning_outside_a_login_attempt_changes_nothing() {
        let mut state = state_for("https://idp.example", "http://localhost:8080");
        state.abandon_login("user gave up").unwrap();
        assert_eq!(state.session().status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn expired_token_ends_the_session_without_a_request() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&api)
            .await;
        let mut state = state_for("https://idp.example", &api.uri());
        state.profiles.set_customer_type(CustomerType::Private);
        let start = state.session.login(&state.idp);
        state.session.take_pending(&state_param(&start)).unwrap();
        state
            .session
            .complete_login(
                UserClaims::new("auth0|42"),
                AccessToken::new("at-old", Some(Utc::now() - TimeDelta::seconds(5))),
            )
            .unwrap();
        state.accept_consent(ConsentSelections::default()).await.unwrap();

        let err = state.call_protected().await.unwrap_err();

        assert!(matches!(err, AppError::Session(SessionError::TokenExpired)));
        assert_eq!(state.session().status(), SessionStatus::Unauthenticated);
        assert!(!state.consent.is_satisfied());
        assert!(state.profiles.customer_type().is_none());
    }

    #[tokio::test]
    async fn logout_clears_dependent_state() {
        let mut state = state_for("https://idp.example", "http://localhost:8080");
        state.profiles.set_customer_type(CustomerType::Private);
        state.accept_consent(ConsentSelections::default()).await.unwrap();
        state.step_up.request_action("view_policy").unwrap();

        state.logout().await.unwrap();

        assert!(!state.consent.is_satisfied());
        assert!(state.profiles.customer_type().is_none());
        assert!(state.step_up.completed_actions().is_empty());
        assert!(state.session().access_token().is_none());
    }
}
