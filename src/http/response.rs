//! Response bodies and JSON response construction.
//!
//! # Responsibilities
//! - Define the JSON shapes returned by every endpoint
//! - Encode bodies with `Content-Type: application/json`
//! - Attach browser hardening headers where requested
//! - Render uptime as a human-readable string

use std::time::Duration;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;

/// Body of `GET /hello`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub build_time: String,
    pub uptime: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub build_time: String,
    pub endpoints: Endpoints,
    pub uptime: String,
}

/// Route table advertised by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub hello: String,
    pub health: String,
    pub ready: String,
    pub metrics: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: String,
    pub version: String,
}

/// Body of `GET /ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    /// RFC 3339, second precision.
    pub timestamp: String,
}

/// Body of `GET /metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub uptime_seconds: f64,
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub version: String,
    pub build_time: String,
    pub runtime_version: String,
}

const SECURITY_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
];

/// Encode `body` as a `200 OK` JSON response.
pub fn json<T: Serialize>(body: &T) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        bytes,
    )
        .into_response())
}

/// Like [`json`], with the browser hardening headers attached.
pub fn secure_json<T: Serialize>(body: &T) -> Result<Response, ApiError> {
    let mut response = json(body)?;
    apply_security_headers(response.headers_mut());
    Ok(response)
}

fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Format an elapsed duration, e.g. `4.250s`, `2m 5.000s`, `1h 0m 3.120s`.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let millis = elapsed.subsec_millis();

    if hours > 0 {
        format!("{}h {}m {}.{:03}s", hours, minutes, seconds, millis)
    } else if minutes > 0 {
        format!("{}m {}.{:03}s", minutes, seconds, millis)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_below_a_minute() {
        assert_eq!(format_uptime(Duration::from_millis(4250)), "4.250s");
        assert_eq!(format_uptime(Duration::ZERO), "0.000s");
    }

    #[test]
    fn uptime_with_minutes_and_hours() {
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m 5.000s");
        assert_eq!(format_uptime(Duration::from_millis(3_603_120)), "1h 0m 3.120s");
    }

    #[test]
    fn json_sets_content_type() {
        let response = json(&serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert!(response.headers().get(header::X_FRAME_OPTIONS).is_none());
    }

    #[test]
    fn secure_json_adds_hardening_headers() {
        let response = secure_json(&serde_json::json!({})).unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_XSS_PROTECTION], "1; mode=block");
    }
}
