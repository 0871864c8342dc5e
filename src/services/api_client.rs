//! Client for the resource server's `/public` and `/protected` endpoints.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;
use crate::services::auth::AccessToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub subject: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedResponse {
    pub message: String,
    pub status: String,
    pub token_info: TokenInfo,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: Url, http: reqwest::Client) -> Self {
        Self { base, http }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn call_public(&self) -> Result<PublicResponse, ApiError> {
        self.get("public", None).await
    }

    /// `Unauthorized { authenticated: true }` means the server refused the token
    /// we sent, which the caller should treat as a dead session.
    pub async fn call_protected(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<ProtectedResponse, ApiError> {
        self.get("protected", token).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&AccessToken>,
    ) -> Result<T, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid api url: {e}")))?;

        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token.secret());
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string())),
            StatusCode::UNAUTHORIZED => {
                let authenticated = token.is_some();
                if authenticated {
                    tracing::warn!(path, "resource server rejected the session token");
                } else {
                    tracing::debug!(path, "unauthenticated request refused");
                }
                Err(ApiError::Unauthorized { authenticated })
            }
            other => Err(ApiError::Status(other.as_u16())),
        }
    }
}
