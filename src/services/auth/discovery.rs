//! OIDC discovery document of the identity provider.

use serde::Deserialize;
use url::Url;

use crate::error::ExchangeError;

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
    #[serde(default)]
    pub jwks_uri: Option<Url>,
}

/// Fetches `{base}/.well-known/openid-configuration`.
pub async fn fetch_metadata(
    http: &reqwest::Client,
    base: &Url,
) -> Result<ProviderMetadata, ExchangeError> {
    let url = base
        .join(".well-known/openid-configuration")
        .map_err(|e| ExchangeError::Discovery(format!("invalid discovery url: {e}")))?;

    tracing::debug!(%url, "fetching provider discovery document");

    let response = http
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| ExchangeError::Discovery(format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ExchangeError::Discovery(format!(
            "discovery returned status {}",
            response.status()
        )));
    }

    response
        .json::<ProviderMetadata>()
        .await
        .map_err(|e| ExchangeError::Discovery(format!("invalid discovery document: {e}")))
}
