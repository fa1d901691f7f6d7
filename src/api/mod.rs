//! HTTP request handlers
//!
//! Intake endpoints (public listener) and dashboard endpoints (statistics
//! listener, behind the Basic auth gate).

pub mod auth;
pub mod download;
pub mod health;
pub mod stats;
pub mod submit;

pub use auth::auth_middleware;
pub use download::download_records;
pub use health::health;
pub use stats::get_stats;
pub use submit::submit_survey;

use serde::Serialize;

/// Generic error body for dashboard endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
