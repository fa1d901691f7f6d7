//! Health check endpoint

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

/// GET /health - liveness probe, served unauthenticated on both listeners.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "surveyd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
