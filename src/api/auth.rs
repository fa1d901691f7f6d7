//! Authentication middleware for the statistics listener
//!
//! HTTP Basic gate in front of the dashboard endpoints. The gate is a
//! boundary check only: handlers behind it never see credentials. An empty
//! configured password disables the gate, which the integration tests rely
//! on.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use tracing::warn;

use crate::AppState;

const CHALLENGE: &str = "Basic realm=\"Stats Dashboard\"";

/// Validates the `Authorization: Basic` header against the configured
/// dashboard credentials. Returns 401 with a challenge when absent or wrong.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !state.dashboard.auth_enabled() {
        return Ok(next.run(request).await);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or(AuthError::MissingCredentials)?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    let text =
        String::from_utf8(decoded).map_err(|e| AuthError::Malformed(e.to_string()))?;
    let (username, password) = text
        .split_once(':')
        .ok_or_else(|| AuthError::Malformed("missing ':' separator".to_string()))?;

    if username == state.dashboard.username && password == state.dashboard.password {
        Ok(next.run(request).await)
    } else {
        warn!("Rejected dashboard login for user {:?}", username);
        Err(AuthError::BadCredentials)
    }
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    Malformed(String),
    BadCredentials,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "authentication required".to_string())
            }
            AuthError::Malformed(msg) => (
                StatusCode::BAD_REQUEST,
                format!("malformed authorization header: {}", msg),
            ),
            AuthError::BadCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
        };

        let body = Json(json!({ "message": message }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, CHALLENGE)], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
