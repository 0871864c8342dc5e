use axum::Json;
use chrono::SecondsFormat;
use serde::Serialize;

use crate::api::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub subject: String,
    pub issuer: String,
    /// RFC 3339, UTC
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub token_info: TokenInfo,
}

/// GET /protected: echoes who the verified token belongs to.
pub async fn protected(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Gratulerer! Du har tilgang til beskyttet data.",
        status: "autentisert",
        token_info: TokenInfo {
            subject: ctx.subject,
            issuer: ctx.issuer,
            expires_at: ctx.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    })
}
