use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PublicResponse {
    pub message: &'static str,
    pub status: &'static str,
}

/// GET /public: same payload for everyone.
pub async fn public() -> Json<PublicResponse> {
    Json(PublicResponse {
        message: "Dette er et offentlig endepunkt - ingen innlogging kreves!",
        status: "åpen",
    })
}
