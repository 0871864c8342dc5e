//! Provider key set (JWKS), fetched on demand and cached by `kid`.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, AlgorithmFamily, DecodingKey};
use tokio::sync::RwLock;
use url::Url;

use super::access_jwt::AccessJwtError;

const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// An unknown `kid` triggers a refetch at most this often (key rotation).
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

struct CachedKeys {
    keys: HashMap<String, (DecodingKey, Algorithm)>,
    fetched_at: Instant,
}

pub struct JwksCache {
    uri: Url,
    http: reqwest::Client,
    ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("uri", &self.uri.as_str())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Signature algorithm a key can verify. Symmetric keys are never accepted.
///
/// A declared `alg` wins when it fits the key material (any RSA algorithm for an
/// RSA key, the curve's own algorithm otherwise); a declared `alg` that does
/// not fit drops the key.
fn key_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    let by_key_type = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Algorithm::RS256,
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => Algorithm::ES256,
            EllipticCurve::P384 => Algorithm::ES384,
            _ => return None,
        },
        AlgorithmParameters::OctetKeyPair(_) => Algorithm::EdDSA,
        _ => return None,
    };

    let Some(declared) = jwk.common.key_algorithm else {
        return Some(by_key_type);
    };
    let declared = Algorithm::from_str(&declared.to_string()).ok()?;
    match by_key_type.family() {
        AlgorithmFamily::Rsa if declared.family() == AlgorithmFamily::Rsa => Some(declared),
        _ if declared == by_key_type => Some(declared),
        _ => None,
    }
}

impl JwksCache {
    pub fn new(uri: Url, http: reqwest::Client) -> Self {
        Self {
            uri,
            http,
            ttl: DEFAULT_TTL,
            cached: RwLock::new(None),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Key and algorithm for `kid`, refetching when the cache is stale or the
    /// kid is unknown.
    pub async fn key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AccessJwtError> {
        let refresh = {
            let cached = self.cached.read().await;
            match cached.as_ref() {
                Some(c) if c.fetched_at.elapsed() < self.ttl => {
                    if let Some(found) = c.keys.get(kid) {
                        return Ok(found.clone());
                    }
                    c.fetched_at.elapsed() >= MIN_REFRESH_INTERVAL
                }
                _ => true,
            }
        };

        if refresh {
            let keys = self.fetch().await?;
            let mut cached = self.cached.write().await;
            *cached = Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            });
        }

        self.cached
            .read()
            .await
            .as_ref()
            .and_then(|c| c.keys.get(kid).cloned())
            .ok_or_else(|| AccessJwtError::UnknownKey(kid.to_string()))
    }

    async fn fetch(&self) -> Result<HashMap<String, (DecodingKey, Algorithm)>, AccessJwtError> {
        tracing::debug!(uri = %self.uri, "fetching jwks");

        let response = self
            .http
            .get(self.uri.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AccessJwtError::KeySet(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AccessJwtError::KeySet(format!(
                "status {}",
                response.status()
            )));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AccessJwtError::KeySet(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("jwk without kid skipped");
                continue;
            };
            let Some(algorithm) = key_algorithm(&jwk) else {
                tracing::warn!(kid = %kid, "jwk with unsupported key type skipped");
                continue;
            };
            match DecodingKey::from_jwk(&jwk) {
                Ok(key) => {
                    keys.insert(kid, (key, algorithm));
                }
                Err(e) => tracing::warn!(kid = %kid, error = %e, "unusable jwk skipped"),
            }
        }

        tracing::info!(count = keys.len(), "jwks loaded");
        Ok(keys)
    }
}
