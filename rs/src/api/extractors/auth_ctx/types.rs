/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - middleware verifies the token and stores this in request extensions
 */
use chrono::{DateTime, Utc};

use crate::services::auth::VerifiedAccessToken;

/// Context attached to a request whose bearer token verified.
///
/// - `subject` is the provider's `sub` (e.g. `auth0|...`)
/// - `scopes` is the space-separated `scope` claim, split
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: String,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

impl From<VerifiedAccessToken> for AuthCtx {
    fn from(token: VerifiedAccessToken) -> Self {
        Self {
            subject: token.subject,
            issuer: token.issuer,
            expires_at: token.expires_at,
            scopes: token.scopes,
        }
    }
}
