//! Survey submission endpoint

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use tracing::{error, info};

use crate::record::Record;
use crate::stats::aggregate;
use crate::validate::validate;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RejectedResponse {
    message: &'static str,
    errors: Vec<String>,
}

/// POST /api/surveys - validate, persist, and refresh the stats cache.
///
/// The cache is rebuilt before the 201 is sent, so a client that sees its
/// submission accepted will find it reflected in the next stats read.
pub async fn submit_survey(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Response {
    let errors = validate(&payload, &state.schema);
    if !errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RejectedResponse {
                message: "validation failed",
                errors,
            }),
        )
            .into_response();
    }

    let ip = client_ip(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        state.trust_proxy,
    );
    let record = Record::new(payload, ip);

    match state.store.append(record).await {
        Ok(records) => {
            state.cache.replace(aggregate(&records, &state.schema));
            info!("Accepted submission, store now holds {}", records.len());
            (
                StatusCode::CREATED,
                Json(SubmitResponse {
                    message: "submission accepted",
                }),
            )
                .into_response()
        }
        Err(e) => {
            // The cache keeps its last-good snapshot; nothing was appended.
            error!("Failed to persist submission: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmitResponse {
                    message: "storage failure, please retry later",
                }),
            )
                .into_response()
        }
    }
}

/// Best-effort client origin. Forwarded headers are only honored when the
/// deployment declares a trusted reverse proxy in front of this service.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(origin) = forwarded {
            return Some(origin.to_string());
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(origin) = real_ip {
            return Some(origin.to_string());
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        headers
    }

    #[test]
    fn forwarded_chain_uses_first_hop() {
        let headers = header_map(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(
            client_ip(&headers, None, true).as_deref(),
            Some("203.0.113.9")
        );
    }

    #[test]
    fn forwarded_headers_ignored_without_trusted_proxy() {
        let headers = header_map(&[("x-forwarded-for", "203.0.113.9")]);
        let peer: SocketAddr = "198.51.100.2:4711".parse().unwrap();
        assert_eq!(
            client_ip(&headers, Some(peer), false).as_deref(),
            Some("198.51.100.2")
        );
    }

    #[test]
    fn real_ip_header_is_the_fallback() {
        let headers = header_map(&[("x-real-ip", "203.0.113.7")]);
        assert_eq!(
            client_ip(&headers, None, true).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn no_source_yields_no_origin() {
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }
}
