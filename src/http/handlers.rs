//! Endpoint handlers.
//!
//! Every handler accepts GET only; any other method (HEAD included) is
//! answered with `405 Method Not Allowed`. Bodies are built fresh per request
//! from the shared, read-only [`AppState`].

use axum::{extract::State, http::Method, response::Response};
use chrono::{SecondsFormat, Utc};

use crate::http::error::ApiError;
use crate::http::response::{
    format_uptime, json, secure_json, Endpoints, HealthResponse, HelloResponse, MetricsResponse,
    ReadyResponse, ServiceInfo,
};
use crate::http::server::AppState;

pub const GREETING: &str = "Hello World!";
pub const SERVICE_NAME: &str = "Hello Web Server";

fn require_get(method: &Method) -> Result<(), ApiError> {
    if *method == Method::GET {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

/// `GET /hello`
pub async fn hello(State(state): State<AppState>, method: Method) -> Result<Response, ApiError> {
    require_get(&method)?;

    secure_json(&HelloResponse {
        message: GREETING.to_string(),
        timestamp: Utc::now(),
        version: state.build.version.clone(),
        build_time: state.build.build_time.clone(),
        uptime: format_uptime(state.uptime()),
    })
}

/// `GET /`, exact path only. Anything unrouted lands in [`not_found`].
pub async fn root(State(state): State<AppState>, method: Method) -> Result<Response, ApiError> {
    require_get(&method)?;

    secure_json(&ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: state.build.version.clone(),
        build_time: state.build.build_time.clone(),
        endpoints: Endpoints {
            hello: "/hello".to_string(),
            health: "/health".to_string(),
            ready: "/ready".to_string(),
            metrics: "/metrics".to_string(),
        },
        uptime: format_uptime(state.uptime()),
    })
}

/// `GET /health`: liveness.
pub async fn health(State(state): State<AppState>, method: Method) -> Result<Response, ApiError> {
    require_get(&method)?;

    json(&HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: format_uptime(state.uptime()),
        version: state.build.version.clone(),
    })
}

/// `GET /ready`: the process is up and serving, so it is always ready.
pub async fn ready(method: Method) -> Result<Response, ApiError> {
    require_get(&method)?;

    json(&ReadyResponse {
        status: "ready".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>, method: Method) -> Result<Response, ApiError> {
    require_get(&method)?;

    json(&MetricsResponse {
        uptime_seconds: state.uptime().as_secs_f64(),
        timestamp: Utc::now().timestamp(),
        version: state.build.version.clone(),
        build_time: state.build.build_time.clone(),
        runtime_version: state.build.runtime.clone(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
