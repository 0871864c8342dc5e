use std::{error::Error as StdError, fmt};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::jwks::JwksCache;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    InvalidKey(String),
    MissingKid,
    UnknownKey(String),
    KeySet(String),
    UnexpectedAlgorithm(Algorithm),
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::InvalidKey(e) => write!(f, "invalid verification key: {}", e),
            Self::MissingKid => write!(f, "token header has no 'kid'"),
            Self::UnknownKey(kid) => write!(f, "no key for kid '{}'", kid),
            Self::KeySet(e) => write!(f, "key set unavailable: {}", e),
            Self::UnexpectedAlgorithm(alg) => write!(f, "algorithm {:?} not accepted", alg),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// Access token (JWT) claims.
///
/// `aud` may be a string or an array; `Validation::set_audience` checks both forms.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub scope: Option<String>,
}

/// What handlers get to see of a verified token.
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// Where signing keys come from.
pub enum KeySource {
    /// One Ed25519 public key (local/dev setups and tests).
    Static(DecodingKey),
    /// The provider's published key set, selected by `kid`.
    Jwks(JwksCache),
}

impl KeySource {
    pub fn ed25519_pem(pem: &str) -> Result<Self, AccessJwtError> {
        DecodingKey::from_ed_pem(pem.as_bytes())
            .map(Self::Static)
            .map_err(|e| AccessJwtError::InvalidKey(e.to_string()))
    }

    fn describe(&self) -> String {
        match self {
            Self::Static(_) => "static ed25519 key".to_string(),
            Self::Jwks(cache) => format!("jwks {}", cache.uri()),
        }
    }
}

/// Bearer access-token verifier: signature, `iss`, `aud`, `exp`.
///
/// Key material is not printable via Debug.
pub struct AuthService {
    keys: KeySource,
    issuer: String,
    audience: String,
    leeway_seconds: u64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("keys", &self.keys.describe())
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        keys: KeySource,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        leeway_seconds: u64,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds,
        }
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway_seconds;
        validation
    }

    /// Picks the key for this token. The header's `alg` must match the key's.
    async fn key_for(&self, token: &str) -> Result<(DecodingKey, Algorithm), AccessJwtError> {
        let header = jsonwebtoken::decode_header(token)?;

        let (key, algorithm) = match &self.keys {
            KeySource::Static(key) => (key.clone(), Algorithm::EdDSA),
            KeySource::Jwks(cache) => {
                let kid = header.kid.as_deref().ok_or(AccessJwtError::MissingKid)?;
                cache.key(kid).await?
            }
        };

        if header.alg != algorithm {
            return Err(AccessJwtError::UnexpectedAlgorithm(header.alg));
        }
        Ok((key, algorithm))
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks signature, `exp`, `iss` and
    /// `aud`. This additionally rejects empty `iss` and `sub`.
    pub async fn verify(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let (key, algorithm) = self.key_for(token).await?;
        let claims =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &self.validation(algorithm))?
                .claims;

        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or(AccessJwtError::EmptyClaim("exp"))?;

        Ok(VerifiedAccessToken {
            subject: claims.sub,
            issuer: claims.iss,
            expires_at,
            scopes: claims
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }
}
