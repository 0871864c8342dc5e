//! Authorization Code + PKCE against the identity provider, and the userinfo lookup.

use chrono::{TimeDelta, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::error::{ClaimsFetchError, ExchangeError};

use super::discovery::{self, ProviderMetadata};
use super::pkce::{self, PkcePair, PkceVerifier};
use super::types::{AccessToken, UserClaims};

pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Client registration with the provider.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub audience: String,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
    pub prompt: Option<String>,
}

impl OAuthSettings {
    pub fn new(client_id: impl Into<String>, audience: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            audience: audience.into(),
            redirect_uri,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            prompt: Some("login".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorization: Url,
    pub token: Url,
    pub userinfo: Url,
}

impl ProviderEndpoints {
    /// Auth0's fixed endpoint paths under `base`.
    pub fn conventional(base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            authorization: base.join("authorize")?,
            token: base.join("oauth/token")?,
            userinfo: base.join("userinfo")?,
        })
    }

    pub fn from_metadata(metadata: ProviderMetadata, base: &Url) -> Result<Self, url::ParseError> {
        let userinfo = match metadata.userinfo_endpoint {
            Some(url) => url,
            None => base.join("userinfo")?,
        };
        Ok(Self {
            authorization: metadata.authorization_endpoint,
            token: metadata.token_endpoint,
            userinfo,
        })
    }
}

/// URL to send the user to, plus what must be kept until the callback arrives.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: Url,
    pending: PendingLogin,
}

impl AuthorizationRequest {
    pub fn state(&self) -> &str {
        self.pending.state()
    }

    pub fn into_parts(self) -> (Url, PendingLogin) {
        (self.url, self.pending)
    }
}

/// In-memory half of a login attempt: the expected `state` and the PKCE verifier.
#[derive(Debug)]
pub struct PendingLogin {
    state: String,
    verifier: PkceVerifier,
}

impl PendingLogin {
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn into_verifier(self) -> PkceVerifier {
        self.verifier
    }
}

/// Starts a login attempt. Implemented by `TokenExchangeClient`.
pub trait BeginLogin {
    fn begin_login(&self) -> AuthorizationRequest;
}

#[derive(Debug)]
pub struct TokenSet {
    pub access_token: AccessToken,
    pub id_token: Option<String>,
    pub scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    settings: OAuthSettings,
    endpoints: ProviderEndpoints,
    http: reqwest::Client,
}

impl TokenExchangeClient {
    pub fn new(settings: OAuthSettings, endpoints: ProviderEndpoints) -> Self {
        Self {
            settings,
            endpoints,
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool reuse).
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Resolves the endpoints from the provider's discovery document.
    pub async fn discover(
        settings: OAuthSettings,
        base: &Url,
        http: reqwest::Client,
    ) -> Result<Self, ExchangeError> {
        let metadata = discovery::fetch_metadata(&http, base).await?;
        let endpoints = ProviderEndpoints::from_metadata(metadata, base)
            .map_err(|e| ExchangeError::Discovery(e.to_string()))?;
        Ok(Self {
            settings,
            endpoints,
            http,
        })
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Exchanges `code` for tokens. The verifier is consumed whatever the outcome.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: PkceVerifier,
    ) -> Result<TokenSet, ExchangeError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.settings.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("code_verifier", verifier.secret()),
        ];

        let response = self
            .http
            .post(self.endpoints.token.clone())
            .form(&params)
            .send()
            .await
            .map_err(ExchangeError::Network)?;
        drop(verifier);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (error, description) = match serde_json::from_str::<ProviderErrorBody>(&body) {
                Ok(parsed) => (parsed.error, parsed.error_description),
                Err(_) => ("unknown_error".to_string(), (!body.is_empty()).then_some(body)),
            };
            tracing::warn!(status = status.as_u16(), %error, "token exchange rejected");
            return Err(ExchangeError::Provider {
                status: status.as_u16(),
                error,
                description,
            });
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

        if let Some(token_type) = body.token_type.as_deref()
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(ExchangeError::InvalidResponse(format!(
                "unsupported token_type {token_type:?}"
            )));
        }

        let expires_at = match body.expires_in.filter(|secs| *secs > 0) {
            Some(secs) => Some(
                TimeDelta::try_seconds(secs)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .ok_or_else(|| {
                        ExchangeError::InvalidResponse(format!("expires_in {secs} out of range"))
                    })?,
            ),
            None => None,
        };

        Ok(TokenSet {
            access_token: AccessToken::new(body.access_token, expires_at),
            id_token: body.id_token,
            scope: body.scope,
        })
    }

    /// Reads the user's claims. Anything but 200 is a failure.
    pub async fn fetch_claims(&self, token: &AccessToken) -> Result<UserClaims, ClaimsFetchError> {
        let response = self
            .http
            .get(self.endpoints.userinfo.clone())
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(ClaimsFetchError::Network)?;

        if response.status() != StatusCode::OK {
            tracing::warn!(status = response.status().as_u16(), "userinfo request failed");
            return Err(ClaimsFetchError::Status(response.status().as_u16()));
        }

        let claims: UserClaims = response
            .json()
            .await
            .map_err(|e| ClaimsFetchError::InvalidResponse(e.to_string()))?;

        if claims.sub.trim().is_empty() {
            return Err(ClaimsFetchError::InvalidResponse("empty 'sub' claim".into()));
        }
        Ok(claims)
    }
}

impl BeginLogin for TokenExchangeClient {
    fn begin_login(&self) -> AuthorizationRequest {
        let state = pkce::generate_state();
        let pkce = PkcePair::generate();

        let mut url = self.endpoints.authorization.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.settings.client_id)
                .append_pair("redirect_uri", self.settings.redirect_uri.as_str())
                .append_pair("scope", &self.settings.scopes.join(" "))
                .append_pair("audience", &self.settings.audience)
                .append_pair("state", &state)
                .append_pair("code_challenge", pkce.challenge())
                .append_pair("code_challenge_method", "S256");
            if let Some(prompt) = &self.settings.prompt {
                query.append_pair("prompt", prompt);
            }
        }

        AuthorizationRequest {
            url,
            pending: PendingLogin {
                state,
                verifier: pkce.into_verifier(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> OAuthSettings {
        OAuthSettings::new(
            "client-123",
            "https://ciam-demo-api",
            "http://127.0.0.1:8765/callback".parse().unwrap(),
        )
    }

    fn client_for(server: &MockServer) -> TokenExchangeClient {
        let base: Url = format!("{}/", server.uri()).parse().unwrap();
        TokenExchangeClient::new(settings(), ProviderEndpoints::conventional(&base).unwrap())
    }

    #[test]
    fn authorization_url_carries_pkce_audience_and_scopes() {
        let base: Url = "https://dev-example.eu.auth0.com/".parse().unwrap();
        let client =
            TokenExchangeClient::new(settings(), ProviderEndpoints::conventional(&base).unwrap());

        let request = client.begin_login();
        let query: HashMap<String, String> = request.url.query_pairs().into_owned().collect();

        assert_eq!(request.url.path(), "/authorize");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["scope"], "openid profile email");
        assert_eq!(query["audience"], "https://ciam-demo-api");
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(query["prompt"], "login");
        assert_eq!(query["state"], request.state());

        let challenge = query["code_challenge"].clone();
        let (_, pending) = request.into_parts();
        assert_eq!(challenge, pkce::s256_challenge(pending.into_verifier().secret()));
    }

    #[test]
    fn each_login_attempt_gets_fresh_state() {
        let base: Url = "https://dev-example.eu.auth0.com/".parse().unwrap();
        let client =
            TokenExchangeClient::new(settings(), ProviderEndpoints::conventional(&base).unwrap());

        assert_ne!(client.begin_login().state(), client.begin_login().state());
    }

    #[tokio::test]
    async fn exchange_posts_code_and_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "token_type": "Bearer",
                "expires_in": 86400,
                "scope": "openid profile email"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_, pending) = client.begin_login().into_parts();
        let tokens = client
            .exchange_code("the-code", pending.into_verifier())
            .await
            .unwrap();

        assert_eq!(tokens.access_token.secret(), "at-1");
        assert!(tokens.access_token.expires_at().is_some());
        assert_eq!(tokens.scope.as_deref(), Some("openid profile email"));
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_is_an_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "token_type": "Bearer",
                "expires_in": 9_000_000_000_000_000_i64
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_, pending) = client.begin_login().into_parts();
        let err = client
            .exchange_code("the-code", pending.into_verifier())
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn provider_error_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_, pending) = client.begin_login().into_parts();
        let err = client
            .exchange_code("stale", pending.into_verifier())
            .await
            .unwrap_err();

        match err {
            ExchangeError::Provider {
                status,
                error,
                description,
            } => {
                assert_eq!(status, 403);
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("Invalid authorization code"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_a_network_error() {
        let base: Url = "http://127.0.0.1:9/".parse().unwrap();
        let client =
            TokenExchangeClient::new(settings(), ProviderEndpoints::conventional(&base).unwrap());
        let (_, pending) = client.begin_login().into_parts();

        let err = client
            .exchange_code("code", pending.into_verifier())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Network(_)));
    }

    #[tokio::test]
    async fn claims_are_fetched_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "auth0|42",
                "email": "kari@example.no",
                "name": "Kari Nordmann",
                "email_verified": true,
                "picture": "https://example.no/kari.png"
            })))
            .mount(&server)
            .await;

        let claims = client_for(&server)
            .fetch_claims(&AccessToken::new("at-1", None))
            .await
            .unwrap();

        assert_eq!(claims.sub, "auth0|42");
        assert_eq!(claims.email.as_deref(), Some("kari@example.no"));
        assert!(claims.is_email_verified());
    }

    #[tokio::test]
    async fn non_200_userinfo_is_claims_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_claims(&AccessToken::new("expired", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimsFetchError::Status(401)));
    }

    #[tokio::test]
    async fn discovery_resolves_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": format!("{}/", server.uri()),
                "authorization_endpoint": format!("{}/custom/authorize", server.uri()),
                "token_endpoint": format!("{}/custom/token", server.uri()),
                "jwks_uri": format!("{}/.well-known/jwks.json", server.uri())
            })))
            .mount(&server)
            .await;

        let base: Url = format!("{}/", server.uri()).parse().unwrap();
        let client = TokenExchangeClient::discover(settings(), &base, reqwest::Client::new())
            .await
            .unwrap();

        assert_eq!(client.endpoints().authorization.path(), "/custom/authorize");
        assert_eq!(client.endpoints().token.path(), "/custom/token");
        // no userinfo_endpoint in the document: falls back to the conventional path
        assert_eq!(client.endpoints().userinfo.path(), "/userinfo");
    }
}
