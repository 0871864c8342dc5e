/*
 * Responsibility
 * - GET / : self-description of the API for people poking at it with curl
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "CIAM Demo API",
        "description": "Customer Identity and Access Management demonstration API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": {
                "url": "/public",
                "method": "GET",
                "auth": "None",
                "description": "Public endpoint - no authentication required"
            },
            "protected": {
                "url": "/protected",
                "method": "GET",
                "auth": "JWT Bearer token",
                "description": "Protected endpoint - requires a valid access token for this API's audience"
            }
        }
    }))
}
